//! Tabula Services Layer
//!
//! This crate sits between callers and the query, schema and connection
//! crates. It executes table data requests and returns view models.
//!
//! # Architecture
//!
//! ```text
//! Callers (tabula-cli, JSON boundary)
//!     ↓
//! Service Layer (tabula-services) ← This crate
//!     ↓
//! Domain Layer (tabula-query, tabula-schema, tabula-connection)
//!     ↓
//! Infrastructure Layer (tabula-core, tabula-driver-sqlite)
//! ```
//!
//! # Engines
//!
//! - [`LocalEngine`] - one in-process database handle
//! - [`ServiceEngine`] - warm connections plus memoized responses
//!
//! Both implement [`TableDataEngine`] and answer identical requests with
//! identical responses, apart from the `cached` flag and timing.

mod config;
mod engine;
mod error;
mod table_service;
mod view_models;

pub use config::EngineConfig;
pub use engine::{EngineCaches, LocalEngine, ServiceEngine, TableDataEngine};
pub use error::{ErrorResponse, ServiceError, ServiceResult};
pub use table_service::TableService;
pub use view_models::TableDataResponse;
