//! Forward geocoding: postal code to coordinates.
//! Uses the OpenWeather geocoding API (same API key as the weather call).

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::provider::handle_response;
use crate::types::{Coordinates, UpstreamError};

pub const OPENWEATHER_GEO_URL: &str = "http://api.openweathermap.org/geo/1.0";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// A geocoded place
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoCoords {
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
    pub country: Option<String>,
}

impl GeoCoords {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Client,
    api_key: String,
    base_url: String,
}

impl Geocoder {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look up the coordinates for a postal code, e.g. `("K2G 1V8", "CA")`.
    pub async fn geo_coords_for_postal_code(
        &self,
        postal_code: &str,
        country_code: &str,
    ) -> Result<GeoCoords, UpstreamError> {
        let zip = format!("{},{}", postal_code.trim(), country_code.trim());
        let url = Url::parse_with_params(
            &format!("{}/zip", self.base_url),
            &[("zip", zip.as_str()), ("appid", self.api_key.as_str())],
        )
        .map_err(|e| UpstreamError::Parse(format!("Invalid geocoding URL: {}", e)))?;

        let response = self.client.get(url).send().await?;
        let coords: GeoCoords = handle_response(response).await?;

        tracing::info!(
            "Geocoded {} to {}, {} ({})",
            zip,
            coords.lat,
            coords.lon,
            coords.name.as_deref().unwrap_or("unnamed")
        );
        Ok(coords)
    }
}
