//! Tabula Schema - schema inspection with per-database caching
//!
//! This crate provides:
//! - `SchemaInspector` - resolves a table's columns, refusing unknown tables
//! - `SchemaCache` - table lists and column metadata keyed by database identity

mod cache;
mod error;
mod inspector;

pub use cache::SchemaCache;
pub use error::SchemaError;
pub use inspector::SchemaInspector;
