//! Cache-aside orchestration in front of the upstream weather API.

use tracing::{debug, info, warn};

use crate::local::LocalFallbackCache;
use crate::primary::{lookup, CacheLookup, PrimaryCache};
use crate::provider::UpstreamClient;
use crate::staleness::{is_stale, STALE_AFTER};
use crate::types::{CacheKey, WeatherError, WeatherPayload, WeatherQuery};

/// Read-through weather fetcher.
///
/// Every call checks the primary cache first. When the primary cache is
/// unreachable the request is served from (and written to) the local
/// fallback cache instead. Each call makes at most one upstream request and
/// writes to at most one cache.
pub struct WeatherService<P, U> {
    primary: P,
    fallback: LocalFallbackCache,
    upstream: U,
}

impl<P: PrimaryCache, U: UpstreamClient> WeatherService<P, U> {
    pub fn new(primary: P, fallback: LocalFallbackCache, upstream: U) -> Self {
        Self {
            primary,
            fallback,
            upstream,
        }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn fallback(&self) -> &LocalFallbackCache {
        &self.fallback
    }

    /// Current conditions for `query`, from cache when possible.
    ///
    /// Fails only when the upstream call was needed and failed.
    pub async fn fetch_weather(&self, query: &WeatherQuery) -> Result<WeatherPayload, WeatherError> {
        let key = query.cache_key();

        match lookup(&self.primary, &key).await {
            CacheLookup::Hit(payload) => {
                info!(key = %key, "Cache HIT (primary)");
                Ok(payload)
            }
            CacheLookup::Miss => {
                info!(key = %key, "Cache MISS, fetching from upstream");
                let payload = self.fetch_upstream(query).await?;
                self.store_primary(key, &payload).await;
                Ok(payload)
            }
            CacheLookup::Unavailable(e) => {
                warn!(
                    key = %key,
                    provider = self.primary.provider_name(),
                    error = %e,
                    "Primary cache unavailable, falling back to local cache"
                );
                self.fetch_with_fallback(query, key).await
            }
        }
    }

    async fn fetch_with_fallback(
        &self,
        query: &WeatherQuery,
        key: CacheKey,
    ) -> Result<WeatherPayload, WeatherError> {
        if let Some(entry) = self.fallback.get(&key) {
            if !is_stale(entry.last_fetch) {
                info!(key = %key, "Cache HIT (local fallback)");
                return Ok(entry.payload);
            }
            debug!(key = %key, last_fetch = %entry.last_fetch, "Local fallback entry is stale");
        }

        info!(key = %key, "Cache MISS, fetching from upstream (fallback)");
        let payload = self.fetch_upstream(query).await?;
        self.fallback.set(key, payload.clone());
        Ok(payload)
    }

    async fn fetch_upstream(&self, query: &WeatherQuery) -> Result<WeatherPayload, WeatherError> {
        self.upstream
            .fetch_current_conditions(query.coordinates, query.units)
            .await
            .map_err(|e| {
                warn!(error = %e, "Upstream weather fetch failed");
                WeatherError::UpstreamUnavailable(e)
            })
    }

    /// Write a fresh payload to the primary cache. If the write fails the
    /// payload goes to the local fallback cache instead.
    async fn store_primary(&self, key: CacheKey, payload: &WeatherPayload) {
        let value = match serde_json::to_string(payload) {
            Ok(v) => v,
            Err(e) => {
                warn!(key = %key, error = %e, "Payload not serializable, skipping cache write");
                return;
            }
        };

        match self.primary.set(key.as_str(), &value, STALE_AFTER).await {
            Ok(()) => debug!(key = %key, "Cached in primary"),
            Err(e) => {
                warn!(key = %key, error = %e, "Primary cache write failed, caching locally");
                self.fallback.set(key, payload.clone());
            }
        }
    }
}
