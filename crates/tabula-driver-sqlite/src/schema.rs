//! SQLite schema introspection
//!
//! Table names are always bound as parameters here, so a name that slipped
//! past validation still cannot change the statement.

use async_trait::async_trait;
use tabula_core::{
    ColumnSchema, Connection, Result, SchemaIntrospection, TableInfo, TableType, TabulaError,
    Value,
};

use crate::SqliteConnection;

const LIST_TABLES_SQL: &str = "SELECT name, type FROM sqlite_master \
     WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
     ORDER BY name";

const TABLE_INFO_SQL: &str =
    "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?) ORDER BY cid";

#[async_trait]
impl SchemaIntrospection for SqliteConnection {
    #[tracing::instrument(skip(self))]
    async fn list_tables(&self) -> Result<Vec<TableInfo>> {
        let result = self.query(LIST_TABLES_SQL, &[]).await?;

        let tables = result
            .rows
            .iter()
            .filter_map(|row| {
                let name = row.get(0)?.as_str()?.to_string();
                let table_type = match row.get(1).and_then(|v| v.as_str()) {
                    Some("view") => TableType::View,
                    _ => TableType::Table,
                };
                Some(TableInfo { name, table_type })
            })
            .collect::<Vec<_>>();

        tracing::debug!(table_count = tables.len(), "listed tables");
        Ok(tables)
    }

    #[tracing::instrument(skip(self))]
    async fn get_columns(&self, table: &str) -> Result<Vec<ColumnSchema>> {
        tracing::trace!(table = %table, "fetching column information");
        let result = self
            .query(TABLE_INFO_SQL, &[Value::String(table.to_string())])
            .await?;

        if result.rows.is_empty() {
            return Err(TabulaError::Schema(format!("Table '{}' does not exist", table)));
        }

        let columns = result
            .rows
            .iter()
            .map(|row| ColumnSchema {
                name: row
                    .get(0)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                declared_type: row
                    .get(1)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                not_null: row.get(2).and_then(|v| v.as_i64()).unwrap_or(0) != 0,
                is_primary_key: row.get(3).and_then(|v| v.as_i64()).unwrap_or(0) > 0,
            })
            .collect();

        Ok(columns)
    }
}
