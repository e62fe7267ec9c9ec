//! Schema cache keyed by database identity

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tabula_core::{ColumnSchema, DatabaseIdentity, TableInfo};

/// Cached schema information for one database
struct CachedSchema {
    tables: Option<Vec<TableInfo>>,
    columns: HashMap<String, Vec<ColumnSchema>>,
    cached_at: Instant,
}

impl CachedSchema {
    fn empty() -> Self {
        Self {
            tables: None,
            columns: HashMap::new(),
            cached_at: Instant::now(),
        }
    }
}

/// Schema cache shared by every connection to the same database.
///
/// Entries are keyed by [`DatabaseIdentity`], so a file that is replaced or
/// modified under the same path never sees the previous file's schema.
pub struct SchemaCache {
    cache: RwLock<HashMap<DatabaseIdentity, CachedSchema>>,
    ttl: Duration,
}

impl SchemaCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Check if a cache entry exists and is within its TTL
    pub fn is_valid(&self, identity: &DatabaseIdentity) -> bool {
        self.cache
            .read()
            .get(identity)
            .map(|cached| cached.cached_at.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    /// Get cached tables
    pub fn get_tables(&self, identity: &DatabaseIdentity) -> Option<Vec<TableInfo>> {
        if !self.is_valid(identity) {
            return None;
        }
        let result = self
            .cache
            .read()
            .get(identity)
            .and_then(|c| c.tables.clone());
        if result.is_some() {
            tracing::trace!(database = %identity.location(), "cache hit for tables");
        } else {
            tracing::debug!(database = %identity.location(), "cache miss for tables");
        }
        result
    }

    /// Get cached columns for a table
    pub fn get_columns(&self, identity: &DatabaseIdentity, table: &str) -> Option<Vec<ColumnSchema>> {
        if !self.is_valid(identity) {
            return None;
        }
        let result = self
            .cache
            .read()
            .get(identity)
            .and_then(|c| c.columns.get(table).cloned());
        if result.is_some() {
            tracing::trace!(database = %identity.location(), table = %table, "cache hit for columns");
        } else {
            tracing::debug!(database = %identity.location(), table = %table, "cache miss for columns");
        }
        result
    }

    /// Store tables. Resets the entry if it had expired, and drops entries
    /// for older identities of the same location.
    pub fn set_tables(&self, identity: &DatabaseIdentity, tables: Vec<TableInfo>) {
        tracing::debug!(database = %identity.location(), table_count = tables.len(), "caching tables");
        let mut cache = self.cache.write();
        Self::evict_superseded(&mut cache, identity);
        let entry = Self::fresh_entry(&mut cache, identity, self.ttl);
        entry.tables = Some(tables);
    }

    /// Store columns for a table
    pub fn set_columns(&self, identity: &DatabaseIdentity, table: &str, columns: Vec<ColumnSchema>) {
        tracing::debug!(database = %identity.location(), table = %table, column_count = columns.len(), "caching columns");
        let mut cache = self.cache.write();
        Self::evict_superseded(&mut cache, identity);
        let entry = Self::fresh_entry(&mut cache, identity, self.ttl);
        entry.columns.insert(table.to_string(), columns);
    }

    fn fresh_entry<'c>(
        cache: &'c mut HashMap<DatabaseIdentity, CachedSchema>,
        identity: &DatabaseIdentity,
        ttl: Duration,
    ) -> &'c mut CachedSchema {
        let entry = cache
            .entry(identity.clone())
            .or_insert_with(CachedSchema::empty);
        if entry.cached_at.elapsed() >= ttl {
            *entry = CachedSchema::empty();
        }
        entry
    }

    fn evict_superseded(
        cache: &mut HashMap<DatabaseIdentity, CachedSchema>,
        identity: &DatabaseIdentity,
    ) {
        cache.retain(|key, _| {
            let superseded = key.location() == identity.location() && key != identity;
            if superseded {
                tracing::info!(database = %key.location(), "database changed, dropping cached schema");
            }
            !superseded
        });
    }

    /// Invalidate the cache for one database
    pub fn invalidate(&self, identity: &DatabaseIdentity) {
        tracing::info!(database = %identity.location(), "invalidating schema cache");
        self.cache.write().remove(identity);
    }

    /// Number of databases with cached schema
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Clear all caches
    pub fn clear(&self) {
        let mut cache = self.cache.write();
        tracing::info!(cache_entries = cache.len(), "clearing all schema caches");
        cache.clear();
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300)) // 5 minute TTL
    }
}
