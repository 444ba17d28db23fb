//! NDVI raster decoding and colorization.
//!
//! Rasters arrive as single-band GeoTIFFs georeferenced through the
//! `ModelPixelScale`/`ModelTiepoint` tag pair. Decoding yields an immutable
//! [`SampleGrid`]; colorizing it produces the RGBA pixels of the overlay and
//! the [`ValueRange`] actually observed, which drives the legend.

use std::io::Cursor;

use field_common::{BoundingBox, CrsCode, ProjectionRegistry};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::gradient::{Color, ColorRamp};
use crate::png;

/// GeoKey ids holding the CRS of projected and geographic rasters.
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;

/// A decoded raster: row-major samples, north row first.
#[derive(Debug, Clone)]
pub struct SampleGrid {
    pub width: usize,
    pub height: usize,
    pub samples: Vec<f64>,
    /// Geographic extent in lng/lat degrees.
    pub bounds: BoundingBox,
    pub crs: CrsCode,
    /// Sentinel declared by the file (GDAL_NODATA), if any.
    pub no_data: Option<f64>,
}

impl SampleGrid {
    pub fn new(
        width: usize,
        height: usize,
        samples: Vec<f64>,
        bounds: BoundingBox,
        crs: CrsCode,
    ) -> RenderResult<Self> {
        let expected = width * height;
        if samples.len() != expected {
            return Err(RenderError::DimensionMismatch {
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
            bounds,
            crs,
            no_data: None,
        })
    }

    pub fn with_no_data(mut self, no_data: Option<f64>) -> Self {
        self.no_data = no_data;
        self
    }

    pub fn sample(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.samples.get(y * self.width + x).copied()
    }

    /// NaN and the declared sentinel carry no measurement.
    pub fn is_no_data(&self, value: f64) -> bool {
        value.is_nan() || self.no_data.is_some_and(|nd| value == nd)
    }
}

/// Decode GeoTIFF bytes into a [`SampleGrid`].
///
/// Multi-band rasters keep their first band. The CRS comes from the GeoKey
/// directory, falling back to the registry default when the file has none.
pub fn decode_geotiff(bytes: &[u8], registry: &ProjectionRegistry) -> RenderResult<SampleGrid> {
    let mut decoder = Decoder::new(Cursor::new(bytes))?;
    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);

    let scale = decoder
        .find_tag(Tag::ModelPixelScaleTag)?
        .ok_or_else(|| RenderError::MissingGeoreference("no ModelPixelScale tag".into()))?
        .into_f64_vec()?;
    let tiepoint = decoder
        .find_tag(Tag::ModelTiepointTag)?
        .ok_or_else(|| RenderError::MissingGeoreference("no ModelTiepoint tag".into()))?
        .into_f64_vec()?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(RenderError::MissingGeoreference(format!(
            "short georeference tags (scale {}, tiepoint {})",
            scale.len(),
            tiepoint.len()
        )));
    }

    let epsg = match decoder.find_tag(Tag::GeoKeyDirectoryTag)? {
        Some(value) => epsg_from_geo_keys(&value.into_u16_vec()?),
        None => None,
    };
    let crs = registry.resolve(epsg)?;

    let no_data = match decoder.find_tag(Tag::GdalNodata)? {
        Some(value) => parse_no_data(&value.into_string()?),
        None => None,
    };

    let samples = samples_as_f64(decoder.read_image()?)?;
    let samples = first_band(samples, width * height)?;

    let (sx, sy) = (scale[0], scale[1]);
    let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
    let min_x = x - i * sx;
    let max_y = y + j * sy;
    let max_x = min_x + width as f64 * sx;
    let min_y = max_y - height as f64 * sy;
    let bounds = registry.bounds_to_lng_lat(crs, min_x, min_y, max_x, max_y);

    debug!(
        width = width,
        height = height,
        crs = %crs,
        no_data = ?no_data,
        "Decoded GeoTIFF raster"
    );

    Ok(SampleGrid::new(width, height, samples, bounds, crs)?.with_no_data(no_data))
}

fn epsg_from_geo_keys(keys: &[u16]) -> Option<u32> {
    // Header is 4 shorts; each key entry is (id, location, count, value).
    let count = *keys.get(3)? as usize;
    keys.get(4..4 + count * 4)?
        .chunks_exact(4)
        .find(|entry| {
            entry[1] == 0
                && (entry[0] == PROJECTED_CS_TYPE_GEO_KEY || entry[0] == GEOGRAPHIC_TYPE_GEO_KEY)
        })
        .map(|entry| entry[3] as u32)
}

fn parse_no_data(raw: &str) -> Option<f64> {
    raw.trim_matches(char::from(0)).trim().parse::<f64>().ok()
}

fn samples_as_f64(image: DecodingResult) -> RenderResult<Vec<f64>> {
    #[allow(unreachable_patterns)]
    let samples = match image {
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|s| s as f64).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|s| s as f64).collect(),
        _ => {
            return Err(RenderError::UnsupportedFormat(
                "unsupported TIFF sample type".into(),
            ))
        }
    };
    Ok(samples)
}

fn first_band(samples: Vec<f64>, pixels: usize) -> RenderResult<Vec<f64>> {
    if pixels == 0 || samples.len() % pixels != 0 || samples.is_empty() {
        return Err(RenderError::DimensionMismatch {
            expected: pixels,
            actual: samples.len(),
        });
    }
    let bands = samples.len() / pixels;
    if bands == 1 {
        return Ok(samples);
    }
    Ok(samples.into_iter().step_by(bands).collect())
}

/// Observed `[low, high]` of the valid samples of one raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub low: f64,
    pub high: f64,
}

impl ValueRange {
    pub const NDVI: ValueRange = ValueRange { low: 0.0, high: 1.0 };

    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn span(&self) -> f64 {
        self.high - self.low
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Running min/max over the samples seen during one colorize pass.
///
/// Only finite, non-negative samples count; negatives are the no-data
/// convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeTracker {
    seen: Option<(f64, f64)>,
}

impl RangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, value: f64) {
        if !value.is_finite() || value < 0.0 {
            return;
        }
        self.seen = Some(match self.seen {
            Some((low, high)) => (low.min(value), high.max(value)),
            None => (value, value),
        });
    }

    pub fn merge(self, other: RangeTracker) -> RangeTracker {
        let seen = match (self.seen, other.seen) {
            (Some((l1, h1)), Some((l2, h2))) => Some((l1.min(l2), h1.max(h2))),
            (a, b) => a.or(b),
        };
        RangeTracker { seen }
    }

    /// Final range clamped into `domain`; `None` when no valid sample was seen.
    pub fn finish(&self, domain: ValueRange) -> Option<ValueRange> {
        self.seen.map(|(low, high)| {
            let low = low.max(domain.low).min(domain.high);
            let high = high.min(domain.high).max(low);
            ValueRange::new(low, high)
        })
    }
}

/// RGBA pixels of a colorized raster plus what the legend needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorizedRaster {
    pub width: usize,
    pub height: usize,
    /// RGBA, 4 bytes per pixel, row-major.
    pub pixels: Vec<u8>,
    pub bounds: BoundingBox,
    /// Observed range clamped to the domain; `None` if every sample was no-data.
    pub range: Option<ValueRange>,
}

impl ColorizedRaster {
    pub fn color_at(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 4;
        let p = self.pixels.get(idx..idx + 4)?;
        Some(Color::new(p[0], p[1], p[2], p[3]))
    }

    /// Encode as PNG, indexed when the palette allows.
    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        png::create_png_auto(&self.pixels, self.width, self.height)
    }
}

/// Color every sample on `ramp` against the fixed `domain`, tracking the observed range.
///
/// Rows are processed in parallel; each row keeps its own tracker and the
/// trackers are merged afterwards, so the result is the same as a single
/// sequential scan.
pub fn colorize(grid: &SampleGrid, ramp: &ColorRamp, domain: ValueRange) -> ColorizedRaster {
    let width = grid.width.max(1);
    let rows: Vec<(Vec<u8>, RangeTracker)> = grid
        .samples
        .par_chunks(width)
        .map(|row| {
            let mut tracker = RangeTracker::new();
            let mut pixels = Vec::with_capacity(row.len() * 4);
            for &value in row {
                let color = if grid.is_no_data(value) {
                    Color::transparent()
                } else {
                    tracker.observe(value);
                    ramp.color_of(value, domain.low, domain.high)
                };
                pixels.extend_from_slice(&[color.r, color.g, color.b, color.a]);
            }
            (pixels, tracker)
        })
        .collect();

    let mut pixels = Vec::with_capacity(grid.samples.len() * 4);
    let mut tracker = RangeTracker::new();
    for (row_pixels, row_tracker) in rows {
        pixels.extend_from_slice(&row_pixels);
        tracker = tracker.merge(row_tracker);
    }

    ColorizedRaster {
        width: grid.width,
        height: grid.height,
        pixels,
        bounds: grid.bounds,
        range: tracker.finish(domain),
    }
}
