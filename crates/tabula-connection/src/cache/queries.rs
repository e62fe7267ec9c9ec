//! Time-bounded response memoization

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use tabula_core::DatabaseIdentity;

use super::config::CacheConfig;
use super::stats::CacheStats;

/// Cache key: the database a response was computed against plus a canonical
/// form of the request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    database: DatabaseIdentity,
    request: String,
}

impl QueryKey {
    pub fn new(database: DatabaseIdentity, request: impl Into<String>) -> Self {
        Self {
            database,
            request: request.into(),
        }
    }

    pub fn database(&self) -> &DatabaseIdentity {
        &self.database
    }
}

struct CachedValue<V> {
    value: V,
    cached_at: Instant,
}

/// TTL cache of computed responses.
///
/// Entries are inserted or refreshed whole, so readers never observe a
/// partially written value. When the cache is full, expired entries are
/// purged first and then the oldest entry is dropped.
pub struct QueryCache<V> {
    entries: DashMap<QueryKey, CachedValue<V>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &QueryKey) -> Option<V> {
        let ttl = self.config.query_ttl();
        if let Some(entry) = self.entries.get(key) {
            if entry.cached_at.elapsed() < ttl {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
        }

        // Drop the entry only if it is still the expired one
        self.entries
            .remove_if(key, |_, entry| entry.cached_at.elapsed() >= ttl);
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, key: QueryKey, value: V) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.query_capacity() {
            self.make_room();
        }
        self.entries.insert(
            key,
            CachedValue {
                value,
                cached_at: Instant::now(),
            },
        );
    }

    fn make_room(&self) {
        let purged = self.purge_expired();
        if purged > 0 && self.entries.len() < self.config.query_capacity() {
            return;
        }

        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().cached_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            tracing::debug!(database = %key.database().location(), "query cache full, dropping oldest entry");
            self.entries.remove(&key);
        }
    }

    /// Remove expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let ttl = self.config.query_ttl();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.cached_at.elapsed() < ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Drop every entry computed against any version of the database at `location`
    pub fn invalidate_database(&self, location: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|key, _| key.database().location() != location);
        let removed = before.saturating_sub(self.entries.len());
        tracing::debug!(location = %location, removed, "invalidated cached responses");
        removed
    }

    pub fn clear(&self) {
        tracing::info!(cache_entries = self.entries.len(), "clearing query cache");
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let ttl = self.config.query_ttl();
        let expired = self
            .entries
            .iter()
            .filter(|entry| entry.value().cached_at.elapsed() >= ttl)
            .count();
        CacheStats {
            entries: self.entries.len(),
            expired,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
