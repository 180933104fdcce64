//! Timestamped cache over the [`StorageAdapter`].
//!
//! Entries younger than the TTL are fresh. Older entries are stale but kept:
//! the fetch path falls back to them when the upstream is unavailable.

use crate::market::IndexSnapshot;
use crate::storage::StorageAdapter;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const CACHE_KEY_PREFIX: &str = "index_cache_";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(60_000);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: IndexSnapshot,
    /// Wall-clock write time, epoch millis.
    pub timestamp: i64,
}

/// A cache hit, fresh or stale.
#[derive(Debug, Clone)]
pub struct Cached {
    pub data: IndexSnapshot,
    pub age_millis: u64,
}

impl Cached {
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        u128::from(self.age_millis) < ttl.as_millis()
    }
}

pub struct IndexCache {
    storage: StorageAdapter,
    ttl: Duration,
}

impl IndexCache {
    pub fn new(storage: StorageAdapter, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn read(&self, key: &str) -> Option<Cached> {
        let entry = self.storage.get(&prefixed(key))?;
        Some(Cached {
            age_millis: age_millis(entry.timestamp),
            data: entry.data,
        })
    }

    pub fn write(&self, key: &str, data: IndexSnapshot) {
        self.storage.put(
            &prefixed(key),
            CacheEntry {
                data,
                timestamp: Utc::now().timestamp_millis(),
            },
        );
    }

    /// Stores an entry with an explicit timestamp.
    pub fn write_entry(&self, key: &str, entry: CacheEntry) {
        self.storage.put(&prefixed(key), entry);
    }

    /// Snapshot of what the cache holds, for diagnostics.
    pub fn report(&self) -> CacheReport {
        let session_store_available = self.storage.session_store_available();

        let mut entries = Vec::new();
        match self.storage.session_store() {
            Some(store) => {
                let keys = store.keys().unwrap_or_default();
                for key in keys.iter().filter_map(|k| k.strip_prefix(CACHE_KEY_PREFIX)) {
                    let cached = self.read(key);
                    entries.push(CacheKeyReport {
                        key: key.to_string(),
                        age_secs: cached.as_ref().map(|c| c.age_millis / 1000),
                        has_data: cached.is_some(),
                    });
                }
            }
            None => {
                for (key, entry) in self.storage.memory_entries() {
                    let key = key.strip_prefix(CACHE_KEY_PREFIX).unwrap_or(&key);
                    entries.push(CacheKeyReport {
                        key: key.to_string(),
                        age_secs: Some(age_millis(entry.timestamp) / 1000),
                        has_data: true,
                    });
                }
            }
        }

        CacheReport {
            cache_count: entries.len(),
            entries,
            session_store_available,
            using_memory_cache: !session_store_available,
            memory_cache_size: self.storage.memory_len(),
            cache_duration_secs: self.ttl.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheReport {
    pub cache_count: usize,
    pub entries: Vec<CacheKeyReport>,
    pub session_store_available: bool,
    pub using_memory_cache: bool,
    pub memory_cache_size: usize,
    pub cache_duration_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheKeyReport {
    pub key: String,
    pub age_secs: Option<u64>,
    pub has_data: bool,
}

fn prefixed(key: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{key}")
}

fn age_millis(timestamp: i64) -> u64 {
    // Clock skew can put the write in the future; that counts as brand new.
    u64::try_from(Utc::now().timestamp_millis() - timestamp).unwrap_or(0)
}
