//! Cache statistics types

use serde::{Deserialize, Serialize};

/// Snapshot of the query cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries currently stored (valid + expired)
    pub entries: usize,
    /// Stored entries whose TTL has elapsed
    pub expired: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Hit ratio (0.0 to 1.0); 0.0 before any lookup
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Snapshot of the connection cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCacheStats {
    /// Warm connections currently held
    pub open: usize,
    /// Connections dropped for inactivity
    pub evicted: u64,
    /// Connections replaced because the database changed or the handle closed
    pub reopened: u64,
}
