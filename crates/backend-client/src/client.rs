//! REST client for the field management backend.
//!
//! Every authenticated request carries the session token in the
//! `Auth-Token` header. Failures come back as `{"data": "<message>"}`; the
//! message is surfaced as-is. A 401 signs the session out.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use field_common::{
    parse_all, Field, FieldId, FieldOption, FieldRegistration, Measurement, MeasurementId, MeasurementValues,
    Metadata, Season, SeasonId, SeasonOption, ServerEvent, Subfield, UserProfile,
};
use futures::Stream;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use crate::sse::decode_events;

/// Header carrying the session token.
pub const AUTH_HEADER: &str = "Auth-Token";

/// Stream of decoded server events.
pub type EventStream = Pin<Box<dyn Stream<Item = ApiResult<ServerEvent>> + Send>>;

/// Raster generated for one field and season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdviRasterInfo {
    /// Path to fetch the raster bytes from.
    pub raster_id: String,
    /// Acquisition date of the satellite scene.
    pub source_date: String,
}

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    session: Arc<Session>,
}

impl BackendClient {
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> ApiResult<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to create HTTP client: {}", e)))?;
        if let Some(token) = &config.auth_token {
            session.set_token(token.clone());
        }
        Ok(Self {
            http,
            base_url: config.server_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Send an authenticated request, turning non-success statuses into errors.
    async fn request(&self, method: Method, endpoint: &str, body: Option<&Value>) -> ApiResult<Response> {
        let token = self.session.token().ok_or(ApiError::NotSignedIn)?;
        debug!(method = %method, endpoint = endpoint, "Backend request");

        let mut request = self.http.request(method, self.url(endpoint)).header(AUTH_HEADER, token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        self.check(response).await
    }

    async fn check(&self, response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.session.sign_out();
            warn!("Session token rejected, signed out");
            return Err(ApiError::Unauthorized);
        }
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("data").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        Err(ApiError::status(status.as_u16(), message))
    }

    async fn get_json(&self, endpoint: &str) -> ApiResult<Value> {
        Ok(self.request(Method::GET, endpoint, None).await?.json().await?)
    }

    async fn get_as<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        Ok(serde_json::from_value(self.get_json(endpoint).await?)?)
    }

    /// Send a request whose response is a `{"data": "<message>"}` envelope.
    async fn send_for_message(&self, method: Method, endpoint: &str, body: Option<&Value>) -> ApiResult<String> {
        let response = self.request(method, endpoint, body).await?;
        // 204 responses carry no body.
        let body: Value = match response.bytes().await? {
            bytes if bytes.is_empty() => Value::Null,
            bytes => serde_json::from_slice(&bytes)?,
        };
        Ok(message_of(&body))
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Exchange credentials for a session token and store it.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<()> {
        let response = self
            .http
            .post(self.url("authentication/sign_in"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await?;
        let data = body.get("data").and_then(Value::as_str);
        match (status.is_success(), data) {
            (true, Some(token)) => {
                self.session.set_token(token);
                Ok(())
            }
            (true, None) => Err(ApiError::Decode("sign-in response without token".into())),
            (false, message) => Err(ApiError::status(
                status.as_u16(),
                message.unwrap_or("sign-in failed"),
            )),
        }
    }

    /// Request an account; the backend mails a confirmation link.
    #[instrument(skip(self, profile))]
    pub async fn sign_up(&self, profile: &UserProfile) -> ApiResult<String> {
        let response = self
            .http
            .post(self.url("authentication/sign_up"))
            .json(&profile.deparse()?)
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            Ok(message_of(&body))
        } else {
            Err(ApiError::status(status.as_u16(), message_of(&body)))
        }
    }

    pub fn sign_out(&self) {
        self.session.sign_out();
    }

    // ------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------

    pub async fn fields(&self) -> ApiResult<Vec<FieldOption>> {
        self.get_as("field").await
    }

    #[instrument(skip(self))]
    pub async fn field(&self, field_id: FieldId) -> ApiResult<Field> {
        Ok(Field::parse(&self.get_json(&format!("field/{}", field_id)).await?)?)
    }

    #[instrument(skip(self, registration), fields(name = %registration.name))]
    pub async fn register_field(&self, registration: &FieldRegistration) -> ApiResult<Field> {
        let body = registration.deparse();
        let response = self.request(Method::POST, "field/register", Some(&body)).await?;
        Ok(Field::parse(&response.json::<Value>().await?)?)
    }

    #[instrument(skip(self))]
    pub async fn unregister_field(&self, field_id: FieldId) -> ApiResult<String> {
        self.send_for_message(Method::DELETE, &format!("field/unregister/{}", field_id), None)
            .await
    }

    // ------------------------------------------------------------------
    // Seasons
    // ------------------------------------------------------------------

    /// Seasons of a field, newest first.
    pub async fn season_options(&self, field_id: FieldId) -> ApiResult<Vec<SeasonOption>> {
        let ids: Vec<String> = self.get_as(&format!("season/{}", field_id)).await?;
        Ok(SeasonOption::from_ids(&ids)?)
    }

    pub async fn season(&self, field_id: FieldId, season_id: SeasonId) -> ApiResult<Season> {
        Ok(Season::parse(&self.get_json(&format!("season/{}/{}", field_id, season_id)).await?)?)
    }

    #[instrument(skip(self, season))]
    pub async fn register_season(&self, field_id: FieldId, season_id: SeasonId, season: &Season) -> ApiResult<Season> {
        self.send_season(&format!("season/register/{}/{}", field_id, season_id), season)
            .await
    }

    #[instrument(skip(self, season))]
    pub async fn update_season(&self, field_id: FieldId, season_id: SeasonId, season: &Season) -> ApiResult<Season> {
        self.send_season(&format!("season/upgister/{}/{}", field_id, season_id), season)
            .await
    }

    async fn send_season(&self, endpoint: &str, season: &Season) -> ApiResult<Season> {
        let body = season.deparse()?;
        let response = self.request(Method::POST, endpoint, Some(&body)).await?;
        Ok(Season::parse(&response.json::<Value>().await?)?)
    }

    #[instrument(skip(self))]
    pub async fn unregister_season(&self, field_id: FieldId, season_id: SeasonId) -> ApiResult<String> {
        self.send_for_message(
            Method::DELETE,
            &format!("season/unregister/{}/{}", field_id, season_id),
            None,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Measurements
    // ------------------------------------------------------------------

    pub async fn measurements(&self, field_id: FieldId, season_id: SeasonId) -> ApiResult<Vec<Measurement>> {
        let body = self
            .get_json(&format!("measurement/{}/{}", field_id, season_id))
            .await?;
        Ok(parse_all(&body, "measurement", Measurement::parse)?)
    }

    pub async fn subfields(&self, field_id: FieldId, season_id: SeasonId) -> ApiResult<Vec<Subfield>> {
        let body = self
            .get_json(&format!("measurement/subfield/{}/{}", field_id, season_id))
            .await?;
        Ok(parse_all(&body, "subfield", Subfield::parse)?)
    }

    /// Ask the backend to split the field and place measurements.
    ///
    /// The new measurements arrive as a `measurement.create` event.
    #[instrument(skip(self))]
    pub async fn determine_positions(&self, field_id: FieldId, season_id: SeasonId) -> ApiResult<String> {
        self.send_for_message(
            Method::GET,
            &format!("measurement/position/{}/{}", field_id, season_id),
            None,
        )
        .await
    }

    #[instrument(skip(self, values))]
    pub async fn update_measurement(
        &self,
        measurement_id: MeasurementId,
        values: &MeasurementValues,
    ) -> ApiResult<String> {
        let body = values.deparse()?;
        self.send_for_message(
            Method::PUT,
            &format!("measurement/upgister/{}", measurement_id),
            Some(&body),
        )
        .await
    }

    #[instrument(skip(self, measurement), fields(measurement_id = measurement.id))]
    pub async fn update_measurement_position(&self, measurement: &Measurement) -> ApiResult<String> {
        let body = measurement.deparse_position();
        self.send_for_message(
            Method::PUT,
            &format!("measurement/position/{}", measurement.id),
            Some(&body),
        )
        .await
    }

    // ------------------------------------------------------------------
    // NDVI rasters
    // ------------------------------------------------------------------

    /// Raster ids of a field by season id.
    pub async fn ndvi_rasters(&self, field_id: FieldId) -> ApiResult<BTreeMap<String, String>> {
        self.get_as(&format!("ndvi_raster/{}", field_id)).await
    }

    /// Raster of one season; the backend generates it on first request.
    #[instrument(skip(self))]
    pub async fn ndvi_raster(&self, field_id: FieldId, season_id: SeasonId) -> ApiResult<NdviRasterInfo> {
        let body = self
            .get_json(&format!("ndvi_raster/{}/{}", field_id, season_id))
            .await?;
        let (raster_id, source_date): (String, String) = serde_json::from_value(body["data"].clone())?;
        Ok(NdviRasterInfo {
            raster_id,
            source_date,
        })
    }

    #[instrument(skip(self))]
    pub async fn ndvi_raster_bytes(&self, raster_id: &str) -> ApiResult<Bytes> {
        let response = self
            .request(Method::GET, &format!("ndvi_raster/{}", raster_id), None)
            .await?;
        Ok(response.bytes().await?)
    }

    // ------------------------------------------------------------------
    // Profile and metadata
    // ------------------------------------------------------------------

    pub async fn profile(&self) -> ApiResult<UserProfile> {
        Ok(UserProfile::parse(&self.get_json("user").await?)?)
    }

    #[instrument(skip(self, profile))]
    pub async fn update_profile(&self, profile: &UserProfile) -> ApiResult<String> {
        let body = profile.deparse()?;
        self.send_for_message(Method::PUT, "user/upgister", Some(&body)).await
    }

    pub async fn metadata(&self) -> ApiResult<Metadata> {
        Ok(Metadata::parse(&self.get_json("metadata").await?)?)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Subscribe to the server event stream of the signed-in user.
    pub async fn events(&self) -> ApiResult<EventStream> {
        let token = self.session.token().ok_or(ApiError::NotSignedIn)?;
        let response = self
            .http
            .get(self.url("sse"))
            .query(&[("auth_token", token.as_str())])
            .timeout(std::time::Duration::from_secs(60 * 60 * 24))
            .send()
            .await?;
        let response = self.check(response).await?;
        Ok(Box::pin(decode_events(Box::pin(response.bytes_stream()))))
    }
}

fn message_of(body: &Value) -> String {
    match body.get("data") {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
