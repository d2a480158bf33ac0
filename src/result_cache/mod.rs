//! Time-boxed in-memory cache of resolved product records.
//!
//! Entries expire lazily: `get` evaluates the TTL at read time and removes
//! the entry it finds stale. A single `parking_lot::Mutex` guards the whole
//! map and is never held across an await point.

use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::page_extractor::ProductRecord;

/// Initial capacity for the entry map
const RESULT_CACHE_INITIAL_CAPACITY: usize = 64;

/// One cached resolution
#[derive(Debug, Clone)]
struct CacheEntry {
    key: String,
    data: ProductRecord,
    /// Monotonic insertion time, used for expiry
    stored_at: Instant,
    /// Wall-clock insertion time, reported when the entry expires
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > ttl
    }
}

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub ttl_seconds: u64,
}

#[derive(Clone)]
pub struct ResultCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl ResultCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::with_capacity(
                RESULT_CACHE_INITIAL_CAPACITY,
            ))),
            ttl,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch a live record, deleting the entry if it has expired.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ProductRecord> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => entry.is_expired(self.ttl, now),
        };

        if expired {
            if let Some(entry) = entries.remove(key) {
                debug!("Cache entry expired: {} (cached at {})", entry.key, entry.cached_at);
            }
            return None;
        }

        entries.get(key).map(|entry| entry.data.clone())
    }

    /// Insert or overwrite a record, stamped now.
    pub fn set(&self, key: &str, record: ProductRecord) {
        let entry = CacheEntry {
            key: key.to_string(),
            data: record,
            stored_at: Instant::now(),
            cached_at: Utc::now(),
        };
        self.entries.lock().insert(key.to_string(), entry);
        debug!("Cached record for {key}");
    }

    /// Remove every entry; returns how many were removed.
    pub fn clear(&self) -> usize {
        let removed = {
            let mut entries = self.entries.lock();
            let count = entries.len();
            entries.clear();
            count
        };
        info!("Cleared {removed} cache entries");
        removed
    }

    /// Remove every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.ttl, now));
        before - entries.len()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.lock();
        let total_entries = entries.len();
        let expired_entries = entries
            .values()
            .filter(|entry| entry.is_expired(self.ttl, now))
            .count();

        CacheStats {
            total_entries,
            valid_entries: total_entries - expired_entries,
            expired_entries,
            ttl_seconds: self.ttl.as_secs(),
        }
    }
}
