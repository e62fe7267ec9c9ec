//! Connection trait

use crate::{DatabaseIdentity, QueryResult, Result, SchemaIntrospection, Value};
use async_trait::async_trait;

/// A database connection
///
/// Every call to [`Connection::query`] prepares its own statement, even when
/// the connection handle is shared between concurrent callers, so results of
/// two requests never interleave.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "sqlite")
    fn driver_name(&self) -> &str;

    /// Execute a query that returns rows (SELECT)
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Identity of the database this connection was opened against
    fn identity(&self) -> &DatabaseIdentity;

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;

    /// Get schema introspection interface if supported
    fn as_schema_introspection(&self) -> Option<&dyn SchemaIntrospection> {
        None
    }
}
