use anyhow::Result;
use clap::Parser;
use skywatch_core::{AppError, Config, ConfigError, WeatherError};
use skywatch_weather::{
    Coordinates, CurrentConditions, Geocoder, LocalFallbackCache, OpenWeatherClient, PrimaryStore,
    WeatherQuery, WeatherService,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skywatch", about = "Current weather conditions with Redis-backed caching")]
struct Cli {
    /// Config file to read instead of the user config directory
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    skywatch_core::init()?;

    let (config, _) = Config::load_validated(cli.config.as_deref())
        .map_err(|e| AppError::Config(ConfigError::from(e)))?;

    let coordinates = match resolve_coordinates(&config).await {
        Ok(coords) => coords,
        Err(e) => {
            tracing::error!("Could not resolve location: {}", e);
            println!("{}", e.user_message());
            return Ok(());
        }
    };

    let upstream = OpenWeatherClient::with_base_url(&config.weather.api_key, &config.weather.base_url)
        .map_err(AppError::from)?;
    let primary = PrimaryStore::connect_or_offline(&config.cache.redis_url).await;
    if primary.is_offline() {
        println!("Shared cache offline; using the in-process cache only.");
    }
    let service = WeatherService::new(primary, LocalFallbackCache::new(), upstream);

    let query = WeatherQuery {
        coordinates,
        units: config.weather.units,
    };
    tracing::info!("Fetching weather for {} ({})", config.location.city, query.cache_key());

    let (conditions, raw) = match service.fetch_weather(&query).await {
        Ok(payload) => (
            CurrentConditions::from_payload(&payload, &config.location.city),
            Some(payload),
        ),
        Err(e) => {
            let err = AppError::from(e);
            tracing::error!("Weather fetch failed: {}", err);
            (CurrentConditions::placeholder(&config.location.city), None)
        }
    };

    println!("Skywatch");
    println!(
        "(LAT: {}, LON: {})\n",
        query.coordinates.lat, query.coordinates.lon
    );
    println!("{}", conditions.render(query.units));

    if let Some(raw) = raw {
        println!("\nRaw data:");
        println!("{}", serde_json::to_string_pretty(&raw)?);
    }

    Ok(())
}

/// Configured coordinates, or the geocoded postal code when none are set.
async fn resolve_coordinates(config: &Config) -> Result<Coordinates, AppError> {
    if let Some((lat, lon)) = config.location.coordinates() {
        return Ok(Coordinates::new(lat, lon));
    }

    let (Some(postal_code), Some(country_code)) = (
        config.location.postal_code.as_deref(),
        config.location.country_code.as_deref(),
    ) else {
        return Err(AppError::Weather(WeatherError::LocationNotFound(
            config.location.city.clone(),
        )));
    };

    let geocoder = Geocoder::new(&config.weather.api_key, &config.weather.geo_base_url)?;
    match geocoder.geo_coords_for_postal_code(postal_code, country_code).await {
        Ok(coords) => Ok(coords.coordinates()),
        Err(e) if e.status() == Some(404) => Err(AppError::Weather(
            WeatherError::LocationNotFound(format!("{},{}", postal_code, country_code)),
        )),
        Err(e) => Err(e.into()),
    }
}
