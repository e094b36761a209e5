//! OpenWeather "current weather" client.

use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use url::Url;

use crate::types::{Coordinates, UnitSystem, UpstreamError, WeatherPayload};

pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Source of truth behind the caches.
pub trait UpstreamClient: Send + Sync {
    /// Fetch current conditions for a location. Makes exactly one request.
    fn fetch_current_conditions(
        &self,
        coordinates: Coordinates,
        units: UnitSystem,
    ) -> impl Future<Output = Result<WeatherPayload, UpstreamError>> + Send;
}

#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .finish()
    }
}

impl OpenWeatherClient {
    pub fn new(api_key: &str) -> Result<Self, UpstreamError> {
        Self::with_base_url(api_key, OPENWEATHER_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET `{base_url}?lat=..&lon=..&units=..&appid=..`
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(
        &self,
        coordinates: Coordinates,
        units: UnitSystem,
    ) -> Result<WeatherPayload, UpstreamError> {
        let lat = coordinates.lat.to_string();
        let lon = coordinates.lon.to_string();
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", units.as_str()),
                ("appid", self.api_key.as_str()),
            ],
        )
        .map_err(|e| UpstreamError::Parse(format!("Invalid weather API URL: {}", e)))?;

        let response = self.client.get(url).send().await?;
        handle_response(response).await
    }
}

impl UpstreamClient for OpenWeatherClient {
    async fn fetch_current_conditions(
        &self,
        coordinates: Coordinates,
        units: UnitSystem,
    ) -> Result<WeatherPayload, UpstreamError> {
        self.fetch(coordinates, units).await
    }
}

/// Decode a 2xx JSON body, or turn the status into an [`UpstreamError`].
pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, UpstreamError> {
    let status = response.status();

    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| UpstreamError::Parse(format!("JSON parse error: {}", e.without_url())))
    } else {
        tracing::debug!("Weather API returned status {}", status);
        Err(UpstreamError::Status {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("Unknown").to_string(),
        })
    }
}
