use serde::{Deserialize, Serialize};
use tabula_core::{ColumnSchema, Value};
use tabula_query::QueryMetadata;

/// One page of table data, as returned to callers
///
/// `data[i].len() == headers.len()` for every row. `total_count` is the size
/// of the filtered set, not of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDataResponse {
    pub headers: Vec<String>,
    pub data: Vec<Vec<Value>>,
    pub total_count: u64,
    pub column_schema: Vec<ColumnSchema>,
    pub query_metadata: QueryMetadata,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub execution_time_ms: f64,
}

impl TableDataResponse {
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Values of one output column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.headers.iter().position(|h| h == name)?;
        Some(self.data.iter().filter_map(|row| row.get(index)).collect())
    }
}
