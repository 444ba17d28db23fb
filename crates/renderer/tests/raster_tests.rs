//! Tests for GeoTIFF decoding and colorization.

use field_common::{CrsCode, ProjectionRegistry};
use renderer::gradient::{Color, ColorRamp};
use renderer::raster::{colorize, decode_geotiff, ValueRange};
use renderer::RenderError;
use test_utils::{
    assert_approx_eq, bbox, constant_grid, encode_geotiff, ndvi_field_grid, ndvi_gradient_grid,
    GeoTiffSpec,
};

fn registry() -> ProjectionRegistry {
    ProjectionRegistry::with_defaults()
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn test_decode_geographic_bounds() {
    let spec = GeoTiffSpec::geographic(20, 10, bbox::STRAUBING_FIELD);
    let bytes = encode_geotiff(&spec, &ndvi_gradient_grid(20, 10));

    let grid = decode_geotiff(&bytes, &registry()).unwrap();
    assert_eq!((grid.width, grid.height), (20, 10));
    assert_eq!(grid.crs, CrsCode::Epsg4326);
    assert_approx_eq!(grid.bounds.min_lng, 12.50, 1e-9);
    assert_approx_eq!(grid.bounds.max_lng, 12.52, 1e-9);
    assert_approx_eq!(grid.bounds.min_lat, 48.80, 1e-9);
    assert_approx_eq!(grid.bounds.max_lat, 48.81, 1e-9);
    assert_approx_eq!(grid.sample(19, 0).unwrap(), 1.0, 1e-6);
}

#[test]
fn test_decode_web_mercator_bounds() {
    // 1 km square starting at the origin of Web Mercator
    let spec = GeoTiffSpec {
        width: 10,
        height: 10,
        min_x: 0.0,
        max_y: 1000.0,
        pixel_width: 100.0,
        pixel_height: 100.0,
        epsg: Some(3857),
        no_data: None,
    };
    let bytes = encode_geotiff(&spec, &constant_grid(10, 10, 0.5));

    let grid = decode_geotiff(&bytes, &registry()).unwrap();
    assert_eq!(grid.crs, CrsCode::Epsg3857);
    assert_approx_eq!(grid.bounds.min_lng, 0.0, 1e-9);
    assert_approx_eq!(grid.bounds.max_lng, 0.008983, 1e-5);
    assert_approx_eq!(grid.bounds.max_lat, 0.008983, 1e-5);
}

#[test]
fn test_missing_geokeys_use_registry_default() {
    let spec = GeoTiffSpec::geographic(4, 4, bbox::STRAUBING_FIELD).with_epsg(None);
    let bytes = encode_geotiff(&spec, &constant_grid(4, 4, 0.3));
    let grid = decode_geotiff(&bytes, &registry()).unwrap();
    assert_eq!(grid.crs, CrsCode::Epsg4326);
}

#[test]
fn test_unregistered_crs_rejected() {
    let spec = GeoTiffSpec::geographic(4, 4, bbox::STRAUBING_FIELD).with_epsg(Some(3857));
    let bytes = encode_geotiff(&spec, &constant_grid(4, 4, 0.3));
    let result = decode_geotiff(&bytes, &ProjectionRegistry::new(CrsCode::Epsg4326));
    assert!(matches!(result, Err(RenderError::Crs(_))));
}

#[test]
fn test_garbage_bytes_fail() {
    let result = decode_geotiff(b"definitely not a tiff", &registry());
    assert!(matches!(result, Err(RenderError::Decode(_))));
}

// ============================================================================
// Colorization
// ============================================================================

#[test]
fn test_colorize_tracks_observed_range() {
    let spec = GeoTiffSpec::geographic(21, 11, bbox::STRAUBING_FIELD);
    let bytes = encode_geotiff(&spec, &ndvi_field_grid(21, 11, -1.0));
    let grid = decode_geotiff(&bytes, &registry()).unwrap();

    let raster = colorize(&grid, &ColorRamp::default(), ValueRange::NDVI);
    let range = raster.range.unwrap();
    assert!(range.low >= 0.2 - 1e-6 && range.low < 0.4);
    assert_approx_eq!(range.high, 0.8, 1e-6);

    // corner lies outside the ellipse
    assert_eq!(raster.color_at(0, 0), Some(Color::transparent()));
    assert!(!raster.color_at(10, 5).unwrap().is_transparent());
    assert_eq!(raster.pixels.len(), 21 * 11 * 4);
}

#[test]
fn test_declared_no_data_is_transparent_and_ignored() {
    let mut samples = constant_grid(4, 1, 0.6);
    samples[1] = 7.0;
    let spec = GeoTiffSpec::geographic(4, 1, bbox::STRAUBING_FIELD).with_no_data(7.0);
    let grid = decode_geotiff(&encode_geotiff(&spec, &samples), &registry()).unwrap();
    assert_eq!(grid.no_data, Some(7.0));

    let raster = colorize(&grid, &ColorRamp::default(), ValueRange::NDVI);
    assert!(raster.color_at(1, 0).unwrap().is_transparent());
    let range = raster.range.unwrap();
    assert_approx_eq!(range.low, 0.6, 1e-6);
    assert_approx_eq!(range.high, 0.6, 1e-6);
}

#[test]
fn test_all_no_data_has_unknown_range() {
    let spec = GeoTiffSpec::geographic(3, 3, bbox::STRAUBING_FIELD);
    let grid = decode_geotiff(&encode_geotiff(&spec, &constant_grid(3, 3, -1.0)), &registry()).unwrap();
    let raster = colorize(&grid, &ColorRamp::default(), ValueRange::NDVI);
    assert!(raster.range.is_none());
    assert!(raster.pixels.chunks_exact(4).all(|p| p[3] == 0));
}

#[test]
fn test_colors_use_domain_not_observed_range() {
    let spec = GeoTiffSpec::geographic(2, 1, bbox::STRAUBING_FIELD);
    let grid = decode_geotiff(&encode_geotiff(&spec, &[0.4, 0.6]), &registry()).unwrap();
    let raster = colorize(&grid, &ColorRamp::default(), ValueRange::NDVI);
    // 0.4 on [0, 1], not the low end of [0.4, 0.6]
    assert_eq!(raster.color_at(0, 0), Some(Color::rgb(153, 102, 0)));
}
