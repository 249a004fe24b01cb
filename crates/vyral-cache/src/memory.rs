//! In-process expiring cache.
//!
//! Used for local development without Redis and as the cache in tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::CacheResult;
use crate::store::CacheStore;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Instant,
    ttl: Duration,
}

/// Maximum number of entries held before writes start evicting.
const MAX_CACHE_ENTRIES: usize = 10_000;

/// Process-local cache with per-entry expiry.
///
/// Expired entries are swept when a write finds the cache full; if it is
/// still full afterwards the entries closest to expiry are dropped.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    capacity: usize,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_capacity(MAX_CACHE_ENTRIES)
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// TTL an entry was stored with, if it is still live.
    pub async fn ttl_of(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.ttl)
    }

    /// Drop expired entries.
    pub async fn purge_expired(&self) {
        let mut entries = self.entries.write().await;
        Self::sweep(&mut entries);
    }

    fn sweep(entries: &mut HashMap<String, Entry>) {
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed = removed, "Purged expired cache entries");
        }
    }

    /// Make room for one more entry.
    fn make_room(&self, entries: &mut HashMap<String, Entry>) {
        Self::sweep(entries);

        // Still full: drop whatever expires soonest
        if entries.len() >= self.capacity {
            let mut by_expiry: Vec<_> = entries
                .iter()
                .map(|(key, e)| (key.clone(), e.expires_at))
                .collect();
            by_expiry.sort_by_key(|(_, expires_at)| *expires_at);

            let to_remove = entries.len() + 1 - self.capacity;
            for (key, _) in by_expiry.into_iter().take(to_remove) {
                entries.remove(&key);
            }
            warn!("Memory cache exceeded capacity, removed {} entries", to_remove);
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.value.clone()))
    }

    async fn put(&self, key: &str, value: &Value, ttl: Duration) -> CacheResult<()> {
        let mut entries = self.entries.write().await;
        if entries.len() >= self.capacity && !entries.contains_key(key) {
            self.make_room(&mut entries);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                expires_at: Instant::now() + ttl,
                ttl,
            },
        );
        Ok(())
    }
}
