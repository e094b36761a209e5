//! Centralized error types for the Skywatch application.
//!
//! Library crates keep their own error enums; this module folds them into
//! one hierarchy with user-facing messages for the conditions view.

use skywatch_weather::UpstreamError;
use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a message suitable for display.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// `{:#}` keeps the whole context chain, e.g. "Failed to parse config file: ..."
impl From<anyhow::Error> for ConfigError {
    fn from(e: anyhow::Error) -> Self {
        ConfigError::Invalid(format!("{:#}", e))
    }
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
        }
    }
}

/// Weather service errors.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Weather API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid API key")]
    InvalidApiKey,
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::LocationNotFound(_) => "Location not found. Check and try again.",
            WeatherError::ApiError { status, .. } if *status >= 500 => {
                "Weather service is having problems. Please try again later."
            }
            WeatherError::ApiError { .. } => "Weather service error. Please try again.",
            WeatherError::InvalidApiKey => "Weather API key is invalid. Check settings.",
        }
    }
}

impl From<UpstreamError> for AppError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Status { status: 401, .. } => {
                AppError::Weather(WeatherError::InvalidApiKey)
            }
            UpstreamError::Status { status, message } => {
                AppError::Weather(WeatherError::ApiError { status, message })
            }
            UpstreamError::Network(e) if e.is_timeout() => AppError::Network(NetworkError::Timeout),
            UpstreamError::Network(e) => {
                AppError::Network(NetworkError::ConnectionFailed(e.to_string()))
            }
            UpstreamError::Parse(msg) => AppError::Network(NetworkError::InvalidResponse(msg)),
        }
    }
}

impl From<skywatch_weather::WeatherError> for AppError {
    fn from(e: skywatch_weather::WeatherError) -> Self {
        match e {
            skywatch_weather::WeatherError::UpstreamUnavailable(upstream) => upstream.into(),
        }
    }
}
