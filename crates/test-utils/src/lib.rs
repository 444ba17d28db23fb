//! Shared test utilities for the fieldmap workspace.
//!
//! This crate provides common testing infrastructure including:
//! - NDVI grid generators and a GeoTIFF encoder for raster fixtures
//! - Wire payload fixtures as the backend sends them
//! - An in-process HTTP server for client tests
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, ndvi_gradient_grid, encode_geotiff};
//! ```

pub mod fixtures;
pub mod generators;
pub mod server;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use server::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of `(lng, lat)` pairs.
///
/// ```ignore
/// use test_utils::assert_lng_lat_approx_eq;
///
/// assert_lng_lat_approx_eq!((12.0001, 48.0001), (12.0, 48.0), 0.001);
/// ```
#[macro_export]
macro_rules! assert_lng_lat_approx_eq {
    (($lng1:expr, $lat1:expr), ($lng2:expr, $lat2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($lng1, $lng2, $epsilon);
        $crate::assert_approx_eq!($lat1, $lat2, $epsilon);
    }};
}
