//! Process-local fallback cache, consulted only when the primary cache is
//! unreachable.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::types::{CacheEntry, CacheKey, WeatherPayload};

/// In-memory key → entry map.
///
/// Unbounded; an entry lives until it is overwritten or the process exits.
#[derive(Debug, Default)]
pub struct LocalFallbackCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl LocalFallbackCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the entry stored under `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.lock().get(key).cloned()
    }

    /// Store `payload` stamped with the current time, replacing any prior entry.
    pub fn set(&self, key: CacheKey, payload: WeatherPayload) {
        self.set_at(key, payload, Utc::now());
    }

    /// Store `payload` with an explicit fetch time.
    pub fn set_at(&self, key: CacheKey, payload: WeatherPayload, last_fetch: DateTime<Utc>) {
        self.entries
            .lock()
            .insert(key, CacheEntry { last_fetch, payload });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
