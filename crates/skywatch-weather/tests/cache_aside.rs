//! Cache-aside behaviour of `WeatherService` against a mock OpenWeather
//! server and a scripted primary cache.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::json;
use skywatch_weather::{
    CacheError, CacheResult, LocalFallbackCache, OpenWeatherClient, PrimaryCache, PrimaryStore,
    UnitSystem, UpstreamError, WeatherError, WeatherQuery, WeatherService,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OTTAWA_KEY: &str = "lat=45.3211&lon=-75.7391&units=metric";

/// Primary cache double: either an in-memory map or a store that refuses
/// every command.
#[derive(Default)]
struct ScriptedCache {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String, Duration)>>,
    down: bool,
}

impl ScriptedCache {
    fn down() -> Self {
        Self {
            down: true,
            ..Default::default()
        }
    }

    fn with_value(key: &str, value: &str) -> Self {
        let cache = Self::default();
        cache.values.lock().insert(key.to_string(), value.to_string());
        cache
    }
}

impl PrimaryCache for ScriptedCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        if self.down {
            return Err(CacheError::ConnectionError("connection refused".into()));
        }
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        if self.down {
            return Err(CacheError::ConnectionError("connection refused".into()));
        }
        self.writes
            .lock()
            .push((key.to_string(), value.to_string(), ttl));
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

fn ottawa() -> WeatherQuery {
    WeatherQuery::new(45.3211, -75.7391, UnitSystem::Metric)
}

fn fresh_payload() -> serde_json::Value {
    json!({
        "weather": [{"main": "Snow", "description": "light snow", "icon": "13d"}],
        "main": {"temp": -7.5, "feels_like": -13.0, "humidity": 86},
        "name": "Ottawa",
        "dt": 1_700_000_000
    })
}

async fn mount_upstream(server: &MockServer, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "45.3211"))
        .and(query_param("lon", "-75.7391"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "test-key"))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

fn service_with<P: PrimaryCache>(
    primary: P,
    fallback: LocalFallbackCache,
    server: &MockServer,
) -> WeatherService<P, OpenWeatherClient> {
    let base = format!("{}/data/2.5/weather", server.uri());
    let upstream = OpenWeatherClient::with_base_url("test-key", &base).unwrap();
    WeatherService::new(primary, fallback, upstream)
}

#[tokio::test]
async fn primary_hit_skips_upstream() {
    let server = MockServer::start().await;
    mount_upstream(&server, ResponseTemplate::new(200).set_body_json(fresh_payload()), 0).await;

    let primary = ScriptedCache::with_value(OTTAWA_KEY, r#"{"name":"Cached Ottawa"}"#);
    let service = service_with(primary, LocalFallbackCache::new(), &server);

    let payload = service.fetch_weather(&ottawa()).await.unwrap();

    assert_eq!(payload, json!({"name": "Cached Ottawa"}));
    assert!(service.primary().writes.lock().is_empty());
}

#[tokio::test]
async fn primary_miss_fetches_once_and_stores_with_ttl() {
    let server = MockServer::start().await;
    mount_upstream(&server, ResponseTemplate::new(200).set_body_json(fresh_payload()), 1).await;

    let service = service_with(ScriptedCache::default(), LocalFallbackCache::new(), &server);

    let payload = service.fetch_weather(&ottawa()).await.unwrap();
    assert_eq!(payload, fresh_payload());

    let writes = service.primary().writes.lock();
    assert_eq!(writes.len(), 1);
    let (key, value, ttl) = &writes[0];
    assert_eq!(key, OTTAWA_KEY);
    assert_eq!(serde_json::from_str::<serde_json::Value>(value).unwrap(), fresh_payload());
    assert_eq!(ttl.as_millis(), 600_000);
    assert!(service.fallback().is_empty());
}

#[tokio::test]
async fn primary_miss_with_upstream_failure_propagates() {
    let server = MockServer::start().await;
    mount_upstream(&server, ResponseTemplate::new(502), 1).await;

    let service = service_with(ScriptedCache::default(), LocalFallbackCache::new(), &server);

    let err = service.fetch_weather(&ottawa()).await.unwrap_err();

    let WeatherError::UpstreamUnavailable(upstream) = err;
    assert_eq!(upstream.status(), Some(502));
    assert!(service.primary().writes.lock().is_empty());
    assert!(service.fallback().is_empty());
}

#[tokio::test]
async fn fallback_fresh_entry_skips_upstream() {
    let server = MockServer::start().await;
    mount_upstream(&server, ResponseTemplate::new(200).set_body_json(fresh_payload()), 0).await;

    let fallback = LocalFallbackCache::new();
    fallback.set(ottawa().cache_key(), json!({"name": "Local Ottawa"}));
    let service = service_with(ScriptedCache::down(), fallback, &server);

    let payload = service.fetch_weather(&ottawa()).await.unwrap();

    assert_eq!(payload, json!({"name": "Local Ottawa"}));
}

#[tokio::test]
async fn fallback_stale_entry_is_refetched_and_overwritten() {
    let server = MockServer::start().await;
    mount_upstream(&server, ResponseTemplate::new(200).set_body_json(fresh_payload()), 1).await;

    let eleven_minutes_ago = Utc::now() - chrono::Duration::minutes(11);
    let fallback = LocalFallbackCache::new();
    fallback.set_at(ottawa().cache_key(), json!({"name": "Old Ottawa"}), eleven_minutes_ago);
    let service = service_with(ScriptedCache::down(), fallback, &server);

    let payload = service.fetch_weather(&ottawa()).await.unwrap();
    assert_eq!(payload, fresh_payload());

    let entry = service.fallback().get(&ottawa().cache_key()).unwrap();
    assert_eq!(entry.payload, fresh_payload());
    assert!(entry.last_fetch > eleven_minutes_ago);
    assert!(service.primary().writes.lock().is_empty());
}

#[tokio::test]
async fn fallback_empty_fetches_and_stores_locally() {
    let server = MockServer::start().await;
    mount_upstream(&server, ResponseTemplate::new(200).set_body_json(fresh_payload()), 1).await;

    let service = service_with(ScriptedCache::down(), LocalFallbackCache::new(), &server);

    service.fetch_weather(&ottawa()).await.unwrap();
    // Served locally the second time around
    let again = service.fetch_weather(&ottawa()).await.unwrap();

    assert_eq!(again, fresh_payload());
    assert_eq!(service.fallback().len(), 1);
}

#[tokio::test]
async fn total_failure_reports_upstream_unavailable() {
    let server = MockServer::start().await;
    mount_upstream(&server, ResponseTemplate::new(503), 1).await;

    let service = service_with(ScriptedCache::down(), LocalFallbackCache::new(), &server);

    let err = service.fetch_weather(&ottawa()).await.unwrap_err();

    assert!(err.to_string().contains("upstream unavailable"));
    match err {
        WeatherError::UpstreamUnavailable(UpstreamError::Status { status, .. }) => {
            assert_eq!(status, 503)
        }
        other => panic!("expected upstream status error, got {:?}", other),
    }
    assert!(service.fallback().is_empty());
}

#[tokio::test]
async fn corrupt_primary_value_uses_fallback_path() {
    let server = MockServer::start().await;
    mount_upstream(&server, ResponseTemplate::new(200).set_body_json(fresh_payload()), 1).await;

    let primary = ScriptedCache::with_value(OTTAWA_KEY, "{truncated");
    let service = service_with(primary, LocalFallbackCache::new(), &server);

    let payload = service.fetch_weather(&ottawa()).await.unwrap();

    assert_eq!(payload, fresh_payload());
    assert!(service.primary().writes.lock().is_empty());
    assert!(service.fallback().get(&ottawa().cache_key()).is_some());
}

#[tokio::test]
async fn offline_store_serves_from_fallback() {
    let server = MockServer::start().await;
    mount_upstream(&server, ResponseTemplate::new(200).set_body_json(fresh_payload()), 1).await;

    let service = service_with(PrimaryStore::Offline, LocalFallbackCache::new(), &server);

    let first = service.fetch_weather(&ottawa()).await.unwrap();
    let second = service.fetch_weather(&ottawa()).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn unreachable_upstream_error_omits_api_key() {
    let upstream = OpenWeatherClient::with_base_url("SECRET-KEY-123", "http://127.0.0.1:9").unwrap();
    let service = WeatherService::new(PrimaryStore::Offline, LocalFallbackCache::new(), upstream);

    let err = service.fetch_weather(&ottawa()).await.unwrap_err();

    assert!(matches!(
        err,
        WeatherError::UpstreamUnavailable(UpstreamError::Network(_))
    ));
    assert!(!err.to_string().contains("SECRET-KEY-123"));
    assert!(!format!("{:?}", err).contains("SECRET-KEY-123"));
}
