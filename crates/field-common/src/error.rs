//! Error types for field map payloads.

use std::fmt::Display;

use thiserror::Error;

/// Result type alias using FieldMapError.
pub type FieldMapResult<T> = Result<T, FieldMapError>;

/// Errors raised while turning wire payloads into domain types.
#[derive(Debug, Error)]
pub enum FieldMapError {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid {entity} payload: {message}")]
    InvalidPayload {
        entity: &'static str,
        message: String,
    },

    #[error("Invalid season id '{0}', expected YYYYMMDD")]
    InvalidSeasonId(String),

    #[error("Invalid server event: {0}")]
    InvalidEvent(String),

    #[error("Unknown event entity: {0}")]
    UnknownEntity(String),

    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

impl FieldMapError {
    /// Create an InvalidPayload error for the named entity.
    pub fn invalid_payload(entity: &'static str, err: impl Display) -> Self {
        Self::InvalidPayload {
            entity,
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FieldMapError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_payload("json", err)
    }
}
