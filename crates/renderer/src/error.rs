//! Error types for raster rendering.

use field_common::FieldMapError;
use thiserror::Error;

/// Result type alias using RenderError.
pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to decode raster: {0}")]
    Decode(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Raster is not georeferenced: {0}")]
    MissingGeoreference(String),

    #[error("Raster has {actual} samples, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Crs(#[from] FieldMapError),
}

impl From<tiff::TiffError> for RenderError {
    fn from(err: tiff::TiffError) -> Self {
        RenderError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Encode(err.to_string())
    }
}
