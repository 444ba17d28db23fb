//! Error types for overlay management.

use field_common::FieldMapError;
use renderer::RenderError;
use thiserror::Error;

use crate::map::OverlayKey;

/// Result type alias using OverlayError.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Errors that can occur while installing or loading overlays.
#[derive(Error, Debug)]
pub enum OverlayError {
    /// Raster bytes could not be fetched.
    #[error("failed to fetch raster '{key}': {message}")]
    Fetch {
        key: String,
        message: String,
        /// The backend rejected the session token.
        auth_expired: bool,
    },

    /// Fetched bytes were not a usable raster.
    #[error("failed to decode raster: {0}")]
    Decode(#[from] RenderError),

    /// A newer request for the same controller finished or started first.
    #[error("request for '{0}' was superseded")]
    Superseded(String),

    /// The key is already installed on the map.
    #[error("overlay {0} is already installed")]
    DuplicateOverlay(OverlayKey),

    /// The key belongs to another controller's namespace.
    #[error("overlay {0} is not managed by this controller")]
    ForeignKey(OverlayKey),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl OverlayError {
    pub fn fetch(key: impl Into<String>, message: impl Into<String>) -> Self {
        OverlayError::Fetch {
            key: key.into(),
            message: message.into(),
            auth_expired: false,
        }
    }

    /// True when the failure came from an expired session; callers sign out.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, OverlayError::Fetch { auth_expired: true, .. })
    }

    /// Superseded requests are expected and never surfaced to the user.
    pub fn is_superseded(&self) -> bool {
        matches!(self, OverlayError::Superseded(_))
    }
}

impl From<FieldMapError> for OverlayError {
    fn from(err: FieldMapError) -> Self {
        OverlayError::InvalidGeometry(err.to_string())
    }
}
