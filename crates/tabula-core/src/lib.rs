//! Tabula Core - shared abstractions for the table data engine
//!
//! This crate provides the types and traits every other Tabula crate
//! depends on:
//!
//! - `DatabaseDriver` - opens connections from a `ConnectionConfig`
//! - `Connection` - executes parameterized statements
//! - `SchemaIntrospection` - lists tables and reads column metadata
//! - Common types like `Value`, `Row`, `ColumnSchema`, `QueryResult`

mod connection;
mod driver;
mod error;
mod schema;
mod types;

pub use connection::*;
pub use driver::*;
pub use error::*;
pub use schema::*;
pub use types::*;
