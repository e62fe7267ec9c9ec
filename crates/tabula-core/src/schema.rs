//! Schema introspection traits and types

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Schema introspection interface
#[async_trait]
pub trait SchemaIntrospection: Send + Sync {
    /// List all user tables and views
    async fn list_tables(&self) -> Result<Vec<TableInfo>>;

    /// Get columns for a table, in declaration order
    async fn get_columns(&self, table: &str) -> Result<Vec<ColumnSchema>>;
}

/// Table information (basic)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub table_type: TableType,
}

/// Table type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableType {
    Table,
    View,
}

/// Column metadata for one table column.
///
/// Sourced once per table per connection and immutable for the lifetime of
/// the cached connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Declared type string exactly as written in `CREATE TABLE` (may be empty)
    #[serde(rename = "type")]
    pub declared_type: String,
    pub not_null: bool,
    pub is_primary_key: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            not_null: false,
            is_primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }
}
