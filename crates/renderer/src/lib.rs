//! Raster and color rendering for field map overlays.
//!
//! - Color mapping of NDVI samples and measurement indices
//! - GeoTIFF decoding into sample grids, with value-range tracking
//! - PNG encoding of colorized rasters
//! - Gradient and binned legends

pub mod error;
pub mod gradient;
pub mod legend;
pub mod png;
pub mod raster;

pub use error::{RenderError, RenderResult};
pub use gradient::{color_of, index_color, Color, ColorRamp};
pub use legend::{BinnedLegend, GradientLegend};
pub use raster::{colorize, decode_geotiff, ColorizedRaster, RangeTracker, SampleGrid, ValueRange};
