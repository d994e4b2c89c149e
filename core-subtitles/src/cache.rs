//! # Subtitle Cache Repository
//!
//! Keyed store for parsed subtitles and other serializable artifacts, layered
//! over [`ArtifactDao`] with expiry and capacity policy from
//! [`SubtitlePreferences`].
//!
//! Each key moves through **absent → fresh → stale → absent**. A record goes
//! stale once it was generated more than `cache_expiry_days` ago; the next
//! read removes it. When the store is full, the least recently read records
//! are evicted to make room.
//!
//! Every operation is best effort. Failures are logged and reported as a
//! miss, `false` or zero, so callers behave as if no cache exists.

use bridge_traits::time::Clock;
use core_library::models::CacheStats;
use core_library::{ArtifactDao, CachedArtifact};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::preferences::SubtitlePreferences;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

pub struct SubtitleCacheRepository {
    dao: Arc<dyn ArtifactDao>,
    preferences: Arc<dyn SubtitlePreferences>,
    clock: Arc<dyn Clock>,
}

impl SubtitleCacheRepository {
    pub fn new(
        dao: Arc<dyn ArtifactDao>,
        preferences: Arc<dyn SubtitlePreferences>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            dao,
            preferences,
            clock,
        }
    }

    async fn expiry_cutoff(&self, now: i64) -> i64 {
        let days = i64::from(self.preferences.cache_expiry_days().await);
        now.saturating_sub(days.saturating_mul(MILLIS_PER_DAY))
    }

    /// Look up `key`. Stale and undecodable records are removed and reported
    /// as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.preferences.enable_cache().await {
            return None;
        }

        let artifact = match self.dao.get_by_key(key).await {
            Ok(Some(artifact)) => artifact,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Cache read failed");
                return None;
            }
        };

        let now = self.clock.unix_timestamp_millis();
        if let Err(e) = self.dao.update_access_metadata(key, now).await {
            warn!(key, error = %e, "Failed to update cache access metadata");
        }

        if artifact.is_older_than(self.expiry_cutoff(now).await) {
            info!(key, generated_at = artifact.generated_at, "Cache entry expired");
            self.remove(key).await;
            return None;
        }

        match serde_json::from_slice(&artifact.payload) {
            Ok(value) => {
                debug!(key, bytes = artifact.payload.len(), "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Cached payload no longer decodes, discarding");
                self.remove(key).await;
                None
            }
        }
    }

    /// Store `value` under `key`, evicting the least recently read records
    /// when a new key would exceed capacity. Returns `false` when caching is
    /// disabled, the capacity is zero, or the write fails.
    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        if !self.preferences.enable_cache().await {
            return false;
        }

        let max = self.preferences.max_cache_size().await;
        if max == 0 {
            debug!(key, "Cache capacity is zero, not storing");
            return false;
        }

        let payload = match serde_json::to_vec(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache value");
                return false;
            }
        };

        let replacing = self.dao.exists_by_key(key).await.unwrap_or_else(|e| {
            warn!(key, error = %e, "Cache lookup failed, treating key as new");
            false
        });
        if !replacing {
            self.enforce_capacity(i64::from(max)).await;
        }

        let artifact = CachedArtifact::new(key, payload, self.clock.unix_timestamp_millis());
        if let Err(e) = self.dao.insert_or_replace(&artifact).await {
            warn!(key, error = %e, "Cache write failed");
            return false;
        }

        debug!(key, bytes = artifact.payload.len(), "Cached artifact");
        self.preferences.record_generation_event(key).await;
        true
    }

    /// Make room for one more record under `max`.
    async fn enforce_capacity(&self, max: i64) {
        let count = match self.dao.count().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to count cache entries, skipping eviction");
                return;
            }
        };

        if count < max {
            return;
        }

        let excess = count - max + 1;
        match self.dao.delete_least_recently_accessed(excess).await {
            Ok(evicted) => info!(count, max, evicted, "Evicted least recently read cache entries"),
            Err(e) => warn!(error = %e, "Cache eviction failed"),
        }
    }

    async fn remove(&self, key: &str) {
        if let Err(e) = self.dao.delete_by_key(key).await {
            warn!(key, error = %e, "Failed to delete cache entry");
        }
    }

    /// Returns `true` if a record was removed.
    pub async fn delete(&self, key: &str) -> bool {
        self.dao.delete_by_key(key).await.unwrap_or_else(|e| {
            warn!(key, error = %e, "Failed to delete cache entry");
            false
        })
    }

    /// Whether a record exists for `key`, fresh or not.
    pub async fn contains(&self, key: &str) -> bool {
        self.dao.exists_by_key(key).await.unwrap_or_else(|e| {
            warn!(key, error = %e, "Cache lookup failed");
            false
        })
    }

    /// Remove every record. Returns the number removed.
    pub async fn clear(&self) -> u64 {
        match self.dao.delete_all().await {
            Ok(removed) => {
                info!(removed, "Cleared subtitle cache");
                removed
            }
            Err(e) => {
                warn!(error = %e, "Failed to clear subtitle cache");
                0
            }
        }
    }

    /// Remove every stale record. Returns the number removed.
    pub async fn clean_expired(&self) -> u64 {
        let cutoff = self.expiry_cutoff(self.clock.unix_timestamp_millis()).await;
        match self.dao.delete_older_than(cutoff).await {
            Ok(removed) => {
                info!(removed, cutoff, "Removed expired cache entries");
                removed
            }
            Err(e) => {
                warn!(error = %e, "Failed to remove expired cache entries");
                0
            }
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let entry_count = self.dao.count().await;
        let total_bytes = self.dao.total_payload_bytes().await;

        match (entry_count, total_bytes) {
            (Ok(entry_count), Ok(total_bytes)) => CacheStats {
                entry_count,
                total_bytes,
            },
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to read cache stats");
                CacheStats::default()
            }
        }
    }
}
