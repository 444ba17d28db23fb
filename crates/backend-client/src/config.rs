//! Client configuration.

use std::time::Duration;

use crate::error::{ApiError, ApiResult};

/// Connection settings for the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL, without a trailing slash.
    pub server_url: String,
    pub request_timeout: Duration,
    /// Token to start with, e.g. from a previous sign-in.
    pub auth_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            request_timeout: Duration::from_secs(30),
            auth_token: None,
        }
    }
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Read `FIELDMAP_SERVER_URL`, `FIELDMAP_REQUEST_TIMEOUT_SECS` and
    /// `FIELDMAP_AUTH_TOKEN`. Unset values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let server_url = std::env::var("FIELDMAP_SERVER_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.server_url);

        let request_timeout = std::env::var("FIELDMAP_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let auth_token = std::env::var("FIELDMAP_AUTH_TOKEN")
            .ok()
            .filter(|token| !token.is_empty());

        Self {
            server_url,
            request_timeout,
            auth_token,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn validate(&self) -> ApiResult<()> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ApiError::Config(format!(
                "server URL '{}' must start with http:// or https://",
                self.server_url
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(ApiError::Config("request timeout must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_slash() {
        assert_eq!(ClientConfig::new("http://farm:8080/").server_url, "http://farm:8080");
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(ClientConfig::new("farm:8080").validate().is_err());
        let config = ClientConfig {
            request_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
