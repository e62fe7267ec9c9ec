//! Cache configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the connection and query caches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Timeout in milliseconds before an unused warm connection is dropped
    idle_timeout_ms: u64,
    /// Interval in milliseconds between background sweeps; 0 disables the sweeper
    sweep_interval_ms: u64,
    /// Time-to-live in milliseconds for memoized responses
    query_ttl_ms: u64,
    /// Maximum number of memoized responses
    query_capacity: usize,
}

impl CacheConfig {
    pub fn new(idle_timeout_ms: u64, query_ttl_ms: u64) -> Self {
        Self {
            idle_timeout_ms,
            sweep_interval_ms: 60_000,
            query_ttl_ms,
            query_capacity: 512,
        }
    }

    /// Set the idle timeout in milliseconds
    pub fn with_idle_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.idle_timeout_ms = timeout_ms;
        self
    }

    /// Set the sweep interval in milliseconds
    pub fn with_sweep_interval_ms(mut self, interval_ms: u64) -> Self {
        self.sweep_interval_ms = interval_ms;
        self
    }

    /// Set the query TTL in milliseconds
    pub fn with_query_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.query_ttl_ms = ttl_ms;
        self
    }

    /// Set the query cache capacity. A capacity of 0 is treated as 1.
    pub fn with_query_capacity(mut self, capacity: usize) -> Self {
        self.query_capacity = capacity.max(1);
        self
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Sweep interval, or `None` when only lazy eviction should run
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_ms > 0).then(|| Duration::from_millis(self.sweep_interval_ms))
    }

    pub fn query_ttl(&self) -> Duration {
        Duration::from_millis(self.query_ttl_ms)
    }

    pub fn query_capacity(&self) -> usize {
        self.query_capacity
    }
}

impl Default for CacheConfig {
    /// Defaults:
    /// - idle_timeout: 10 minutes
    /// - sweep_interval: 1 minute
    /// - query_ttl: 5 minutes
    /// - query_capacity: 512
    fn default() -> Self {
        Self::new(600_000, 300_000)
    }
}
