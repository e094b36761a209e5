use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use skywatch_weather::geocode::OPENWEATHER_GEO_URL;
use skywatch_weather::provider::OPENWEATHER_BASE_URL;
use skywatch_weather::UnitSystem;
use std::path::{Path, PathBuf};
use url::Url;

const API_KEY_ENV: &str = "WEATHER_API_KEY";
const REDIS_URL_ENV: &str = "REDIS_URL";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Location shown on the conditions page
    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeather API key (overridden by `WEATHER_API_KEY`)
    #[serde(default)]
    pub api_key: String,

    /// Current weather endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Geocoding API root
    #[serde(default = "default_geo_base_url")]
    pub geo_base_url: String,

    #[serde(default)]
    pub units: UnitSystem,
}

fn default_base_url() -> String {
    OPENWEATHER_BASE_URL.to_string()
}

fn default_geo_base_url() -> String {
    OPENWEATHER_GEO_URL.to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            geo_base_url: default_geo_base_url(),
            units: UnitSystem::Metric,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_city")]
    pub city: String,
    pub postal_code: Option<String>,
    pub country_code: Option<String>,
    /// When lat/lon are absent the postal code is geocoded at start-up
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

fn default_city() -> String {
    "Ottawa".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        // Algonquin College, Woodroffe Campus
        Self {
            city: default_city(),
            postal_code: Some("K2G 1V8".to_string()),
            country_code: Some("CA".to_string()),
            lat: Some(45.3211),
            lon: Some(-75.7391),
        }
    }
}

impl LocationConfig {
    /// Configured coordinates, if both are present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Primary cache connection string (overridden by `REDIS_URL`)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
        }
    }
}

impl Config {
    /// Load configuration from the user config directory, creating a default
    /// file if it doesn't exist, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            Self::read_file(&config_path)?
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            config
        };

        config.apply_env();
        Ok(config)
    }

    /// Load configuration from an explicit file, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env();
        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Reads `path` when given, otherwise the user config file. Warnings are
    /// logged; any error fails the load.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(REDIS_URL_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, api_key: Option<String>, redis_url: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.weather.api_key = key;
        }
        if let Some(url) = redis_url.filter(|u| !u.is_empty()) {
            self.cache.redis_url = url;
        }
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.weather.api_key.trim().is_empty() {
            result.add_error(
                "weather.api_key",
                format!("API key is required (set it here or via {})", API_KEY_ENV),
            );
        }

        validate_url(
            &self.weather.base_url,
            "weather.base_url",
            &["http", "https"],
            &mut result,
        );
        validate_url(
            &self.weather.geo_base_url,
            "weather.geo_base_url",
            &["http", "https"],
            &mut result,
        );
        validate_url(
            &self.cache.redis_url,
            "cache.redis_url",
            &["redis", "rediss"],
            &mut result,
        );

        let location = &self.location;
        match (location.lat, location.lon) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location.lat", "Latitude must be between -90 and 90");
                }
                if !(-180.0..=180.0).contains(&lon) {
                    result.add_error("location.lon", "Longitude must be between -180 and 180");
                }
            }
            (None, None) => {
                if location.postal_code.is_none() || location.country_code.is_none() {
                    result.add_error(
                        "location",
                        "Either lat/lon or postal_code and country_code must be set",
                    );
                }
            }
            _ => result.add_error("location", "lat and lon must be set together"),
        }

        if location.city.trim().is_empty() {
            result.add_warning("location.city", "City name is empty");
        }

        result
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skywatch");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, schemes: &[&str], result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if !schemes.contains(&url.scheme()) {
                result.add_error(
                    field_name,
                    format!(
                        "URL must use {} scheme, got: {}",
                        schemes.join(" or "),
                        url.scheme()
                    ),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
