//! Schema Inspector

use std::sync::Arc;
use tabula_core::{ColumnSchema, Connection, TableInfo};
use tabula_query::validate_identifier;

use crate::{SchemaCache, SchemaError};

/// Resolves table metadata through a connection, caching per database
#[derive(Clone)]
pub struct SchemaInspector {
    cache: Arc<SchemaCache>,
}

impl SchemaInspector {
    pub fn new(cache: Arc<SchemaCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// Tables and views of the connected database
    pub async fn tables(&self, conn: &dyn Connection) -> Result<Vec<TableInfo>, SchemaError> {
        let identity = conn.identity();
        if let Some(tables) = self.cache.get_tables(identity) {
            return Ok(tables);
        }

        let introspection = conn
            .as_schema_introspection()
            .ok_or_else(|| SchemaError::NotSupported(conn.driver_name().to_string()))?;
        let tables = introspection.list_tables().await?;
        self.cache.set_tables(identity, tables.clone());
        Ok(tables)
    }

    /// Ordered columns of `table`.
    ///
    /// The name must be a plain identifier and must appear in the database's
    /// table list; anything else fails before any PRAGMA runs.
    #[tracing::instrument(skip(self, conn), fields(database = %conn.identity().location()))]
    pub async fn columns(
        &self,
        conn: &dyn Connection,
        table: &str,
    ) -> Result<Vec<ColumnSchema>, SchemaError> {
        validate_identifier(table)?;

        let identity = conn.identity();
        if let Some(columns) = self.cache.get_columns(identity, table) {
            return Ok(columns);
        }

        let tables = self.tables(conn).await?;
        if !tables.iter().any(|t| t.name == table) {
            tracing::warn!(table = %table, "requested table is not in the database");
            return Err(SchemaError::TableNotFound(table.to_string()));
        }

        let introspection = conn
            .as_schema_introspection()
            .ok_or_else(|| SchemaError::NotSupported(conn.driver_name().to_string()))?;
        let columns = introspection.get_columns(table).await?;
        if columns.is_empty() {
            return Err(SchemaError::TableNotFound(table.to_string()));
        }

        tracing::debug!(table = %table, column_count = columns.len(), "loaded column schema");
        self.cache.set_columns(identity, table, columns.clone());
        Ok(columns)
    }
}
