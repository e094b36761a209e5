//! Freshness window for the local fallback cache.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Age after which a fallback entry is treated as a miss.
/// Also the TTL given to primary cache writes.
pub const STALE_AFTER: Duration = Duration::from_secs(10 * 60);

/// True when `last_fetch` is more than [`STALE_AFTER`] in the past.
pub fn is_stale(last_fetch: DateTime<Utc>) -> bool {
    is_stale_at(last_fetch, Utc::now())
}

/// Same as [`is_stale`] against an explicit clock reading.
pub fn is_stale_at(last_fetch: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    match TimeDelta::from_std(STALE_AFTER) {
        Ok(limit) => now.signed_duration_since(last_fetch) > limit,
        Err(_) => false,
    }
}
