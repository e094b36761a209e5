//! Current weather for Skywatch
//!
//! Fetches current conditions from the OpenWeather API behind a cache-aside
//! layer: a shared Redis cache first, with an in-process fallback cache when
//! Redis is unreachable.

pub mod conditions;
pub mod geocode;
pub mod local;
pub mod primary;
pub mod provider;
pub mod service;
pub mod staleness;
pub mod types;

pub use conditions::CurrentConditions;
pub use geocode::{GeoCoords, Geocoder};
pub use local::LocalFallbackCache;
pub use primary::{CacheLookup, PrimaryCache, PrimaryStore, RedisCache};
pub use provider::{OpenWeatherClient, UpstreamClient};
pub use service::WeatherService;
pub use types::*;
