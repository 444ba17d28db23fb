//! Test data generators for synthetic NDVI rasters.
//!
//! Grids are row-major with row 0 at the north edge, the layout GeoTIFF
//! rasters use.

use std::io::Cursor;

use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

/// Creates an NDVI grid ramping from 0.0 at the west edge to 1.0 at the east edge.
///
/// # Example
///
/// ```
/// use test_utils::ndvi_gradient_grid;
///
/// let grid = ndvi_gradient_grid(5, 2);
/// assert_eq!(grid.len(), 10);
/// assert_eq!(grid[0], 0.0);
/// assert_eq!(grid[4], 1.0);
/// ```
pub fn ndvi_gradient_grid(width: usize, height: usize) -> Vec<f32> {
    let denominator = width.saturating_sub(1).max(1) as f32;
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(col as f32 / denominator);
        }
    }
    data
}

/// Creates a grid where every cell holds `value`.
pub fn constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a field-shaped NDVI grid: vegetation values inside an ellipse,
/// `outside` (typically a negative no-data marker) around it.
///
/// Inside values vary between 0.2 and 0.8 so the observed range is known.
pub fn ndvi_field_grid(width: usize, height: usize, outside: f32) -> Vec<f32> {
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let rx = (width as f32 / 2.0).max(1.0);
    let ry = (height as f32 / 2.0).max(1.0);

    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dx = (col as f32 - cx) / rx;
            let dy = (row as f32 - cy) / ry;
            let r2 = dx * dx + dy * dy;
            if r2 <= 1.0 {
                data.push(0.8 - 0.6 * r2);
            } else {
                data.push(outside);
            }
        }
    }
    data
}

/// Georeferencing written into a generated GeoTIFF.
#[derive(Debug, Clone)]
pub struct GeoTiffSpec {
    pub width: u32,
    pub height: u32,
    /// West edge in CRS units.
    pub min_x: f64,
    /// North edge in CRS units.
    pub max_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
    /// EPSG code recorded in the GeoKey directory; `None` omits the directory.
    pub epsg: Option<u16>,
    /// Written as the GDAL_NODATA tag when set.
    pub no_data: Option<f64>,
}

impl GeoTiffSpec {
    /// Geographic raster covering `[min_lng, max_lng] x [min_lat, max_lat]`.
    pub fn geographic(width: u32, height: u32, bbox: (f64, f64, f64, f64)) -> Self {
        let (min_lng, min_lat, max_lng, max_lat) = bbox;
        Self {
            width,
            height,
            min_x: min_lng,
            max_y: max_lat,
            pixel_width: (max_lng - min_lng) / width as f64,
            pixel_height: (max_lat - min_lat) / height as f64,
            epsg: Some(4326),
            no_data: None,
        }
    }

    pub fn with_no_data(mut self, no_data: f64) -> Self {
        self.no_data = Some(no_data);
        self
    }

    pub fn with_epsg(mut self, epsg: Option<u16>) -> Self {
        self.epsg = epsg;
        self
    }
}

/// Encodes a single-band `f32` GeoTIFF in memory.
///
/// # Panics
///
/// Panics if `samples` does not hold `width * height` values or encoding fails.
pub fn encode_geotiff(spec: &GeoTiffSpec, samples: &[f32]) -> Vec<u8> {
    assert_eq!(
        samples.len(),
        (spec.width * spec.height) as usize,
        "sample count does not match raster dimensions"
    );

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut cursor).expect("create TIFF encoder");
        let mut image = encoder
            .new_image::<colortype::Gray32Float>(spec.width, spec.height)
            .expect("create TIFF image");

        let scale = [spec.pixel_width, spec.pixel_height, 0.0];
        let tiepoint = [0.0, 0.0, 0.0, spec.min_x, spec.max_y, 0.0];
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &scale[..])
            .expect("write pixel scale");
        image
            .encoder()
            .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
            .expect("write tiepoint");

        if let Some(epsg) = spec.epsg {
            let geo_keys = geo_key_directory(epsg);
            image
                .encoder()
                .write_tag(Tag::GeoKeyDirectoryTag, &geo_keys[..])
                .expect("write geokeys");
        }
        if let Some(no_data) = spec.no_data {
            let text = no_data.to_string();
            image
                .encoder()
                .write_tag(Tag::GdalNodata, text.as_str())
                .expect("write nodata");
        }

        image.write_data(samples).expect("write TIFF data");
    }
    cursor.into_inner()
}

// GTModelTypeGeoKey plus the CRS key matching the model type.
fn geo_key_directory(epsg: u16) -> Vec<u16> {
    let (model_type, crs_key) = if epsg == 4326 { (2, 2048) } else { (1, 3072) };
    vec![1, 1, 0, 2, 1024, 0, 1, model_type, crs_key, 0, 1, epsg]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_grid_range() {
        let grid = ndvi_field_grid(21, 11, -1.0);
        let inside: Vec<f32> = grid.iter().copied().filter(|v| *v >= 0.0).collect();
        assert!(!inside.is_empty());
        assert!(inside.iter().all(|v| (0.2..=0.8).contains(v)));
        assert_eq!(grid[0], -1.0);
    }

    #[test]
    fn test_encode_geotiff_header() {
        let spec = GeoTiffSpec::geographic(4, 2, (12.0, 48.0, 12.4, 48.2));
        let bytes = encode_geotiff(&spec, &ndvi_gradient_grid(4, 2));
        assert!(bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*"));
    }
}
