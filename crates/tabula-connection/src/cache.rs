//! Query/Connection Cache
//!
//! # Example
//!
//! ```ignore
//! use tabula_connection::{CacheConfig, ConnectionCache, DriverFactory};
//!
//! let config = CacheConfig::default().with_idle_timeout_ms(600_000);
//! let cache = Arc::new(ConnectionCache::new(config, DriverFactory::new(SqliteDriver::new())));
//! let sweeper = cache.spawn_sweeper();
//! let conn = cache.acquire("/data/results.db").await?;
//! ```

mod config;
mod connections;
mod queries;
mod stats;


pub use config::CacheConfig;
pub use connections::{ConnectionCache, ConnectionFactory, DriverFactory};
pub use queries::{QueryCache, QueryKey};
pub use stats::{CacheStats, ConnectionCacheStats};
