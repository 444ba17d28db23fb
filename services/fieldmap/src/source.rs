//! Backend-backed raster source for the NDVI overlay.

use std::sync::Arc;

use async_trait::async_trait;
use backend_client::{ApiError, BackendClient};
use bytes::Bytes;
use overlay::{OverlayError, OverlayResult, RasterSource};

/// Fetches NDVI GeoTIFFs through the signed-in [`BackendClient`].
pub struct BackendRasters {
    client: Arc<BackendClient>,
}

impl BackendRasters {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RasterSource for BackendRasters {
    async fn fetch_raster(&self, raster_id: &str) -> OverlayResult<Bytes> {
        self.client
            .ndvi_raster_bytes(raster_id)
            .await
            .map_err(|err| fetch_error(raster_id, err))
    }
}

fn fetch_error(key: &str, err: ApiError) -> OverlayError {
    OverlayError::Fetch {
        key: key.to_string(),
        auth_expired: err.is_auth_expired(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use backend_client::{ClientConfig, Session};
    use serde_json::json;
    use test_utils::spawn_server;

    async fn rasters(token: &str) -> (BackendRasters, Arc<Session>) {
        let router = Router::new().route(
            "/ndvi_raster/:raster",
            get(|Path(raster): Path<String>| async move {
                match raster.as_str() {
                    "1_20240315.tif" => Ok(Bytes::from_static(b"II*\0raster")),
                    "stale.tif" => Err((StatusCode::UNAUTHORIZED, Json(json!({"data": "Token expired"})))),
                    _ => Err((StatusCode::NOT_FOUND, Json(json!({"data": "Raster not found"})))),
                }
            }),
        );
        let url = spawn_server(router).await;
        let session = Arc::new(Session::new(Some(token.to_string())));
        let client = BackendClient::new(&ClientConfig::new(url), session.clone()).unwrap();
        (BackendRasters::new(Arc::new(client)), session)
    }

    #[tokio::test]
    async fn test_fetch_raster() {
        let (rasters, _) = rasters("token").await;

        let bytes = rasters.fetch_raster("1_20240315.tif").await.unwrap();
        assert_eq!(&bytes[..], b"II*\0raster");

        let err = rasters.fetch_raster("missing.tif").await.unwrap_err();
        assert!(!err.is_auth_expired());
        assert!(err.to_string().contains("missing.tif"));
        assert!(err.to_string().contains("Raster not found"));
    }

    #[tokio::test]
    async fn test_fetch_raster_flags_expired_token() {
        let (rasters, session) = rasters("token").await;

        let err = rasters.fetch_raster("stale.tif").await.unwrap_err();

        assert!(err.is_auth_expired());
        assert!(!session.is_signed_in());
    }
}
