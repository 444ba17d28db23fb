//! Error types for backend communication.

use field_common::FieldMapError;
use thiserror::Error;

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;

/// Message reported when the backend rejects the session token.
pub const AUTH_EXPIRED_MESSAGE: &str = "Access token is outdated";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success status; `message` is the body's `data` when present.
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    /// The session token expired; the session has been signed out.
    #[error("{}", AUTH_EXPIRED_MESSAGE)]
    Unauthorized,

    /// No token is available to authenticate a request.
    #[error("No authentication token to communicate with server")]
    NotSignedIn,

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Payload(#[from] FieldMapError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            message: message.into(),
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
