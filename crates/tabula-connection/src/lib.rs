//! Tabula Connection - warm connection and query result caching
//!
//! This crate keeps database handles open between requests and memoizes
//! responses for a bounded time. Both caches are keyed by database identity,
//! so a database file that changes on disk is reopened and its cached
//! responses stop matching.

pub mod cache;

pub use cache::{
    CacheConfig, CacheStats, ConnectionCache, ConnectionCacheStats, ConnectionFactory,
    DriverFactory, QueryCache, QueryKey,
};
