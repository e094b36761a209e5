use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw current-conditions document from the upstream provider.
///
/// The cache layer never looks inside it; it is stored and returned as-is.
pub type WeatherPayload = serde_json::Value;

/// Unit system understood by the OpenWeather API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Kelvin, metres per second
    Standard,
    /// Celsius, metres per second
    #[default]
    Metric,
    /// Fahrenheit, miles per hour
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }

    /// Suffix used when displaying a temperature in this unit system
    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Self::Standard => "K",
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            other => Err(format!("unknown unit system: {}", other)),
        }
    }
}

/// Geographic coordinates in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Input to a cached weather fetch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherQuery {
    pub coordinates: Coordinates,
    pub units: UnitSystem,
}

impl WeatherQuery {
    pub fn new(lat: f64, lon: f64, units: UnitSystem) -> Self {
        Self {
            coordinates: Coordinates::new(lat, lon),
            units,
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.coordinates, self.units)
    }
}

/// Identity of a cached response in both the primary and fallback caches.
///
/// Formatted as the upstream query string (`lat=..&lon=..&units=..`), so
/// identical inputs always produce the identical key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(coordinates: Coordinates, units: UnitSystem) -> Self {
        // `+ 0.0` folds -0.0 into 0.0 so equal coordinates share a key
        Self(format!(
            "lat={}&lon={}&units={}",
            coordinates.lat + 0.0,
            coordinates.lon + 0.0,
            units
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A payload together with the moment it was stored
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub last_fetch: DateTime<Utc>,
    pub payload: WeatherPayload,
}

/// Upstream (weather provider) errors
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Weather API error: {status} {message}")]
    Status { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(String),
}

// Request URLs carry the API key, so they never make it into error text.
impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.without_url())
    }
}

impl UpstreamError {
    /// HTTP status reported by the provider, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            Self::Parse(_) => None,
        }
    }
}

/// Primary cache errors. Always recovered from inside the service.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache serialization error: {0}")]
    SerializationError(String),
    #[error("Cache backend error: {0}")]
    BackendError(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced by [`crate::WeatherService::fetch_weather`]
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Weather upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),
}
