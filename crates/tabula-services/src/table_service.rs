//! Table data service
//!
//! Runs a compiled request against a connection and materializes the page.

use std::time::Instant;
use tabula_core::{ColumnSchema, Connection, QueryResult};
use tabula_query::{CompiledQuery, QueryMode, TableDataRequest, compile, normalize_rows};
use tabula_schema::SchemaInspector;

use crate::config::EngineConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::view_models::TableDataResponse;

/// Service for paged, filtered table reads
///
/// Handles:
/// - Schema lookup through the [`SchemaInspector`]
/// - Request compilation and the COUNT + page statements
/// - Null-last normalization of sorted pages
#[derive(Clone)]
pub struct TableService {
    inspector: SchemaInspector,
    config: EngineConfig,
}

impl TableService {
    pub fn new(inspector: SchemaInspector, config: EngineConfig) -> Self {
        Self { inspector, config }
    }

    pub fn inspector(&self) -> &SchemaInspector {
        &self.inspector
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch one page of table data
    ///
    /// The COUNT statement runs first and shares the page's WHERE clause, so
    /// `total_count` always describes the set the page was cut from.
    #[tracing::instrument(skip(self, connection, request), fields(table = %request.table_name))]
    pub async fn fetch_table_data(
        &self,
        connection: &dyn Connection,
        request: &TableDataRequest,
    ) -> ServiceResult<TableDataResponse> {
        let started = Instant::now();

        let schema = self
            .inspector
            .columns(connection, &request.table_name)
            .await?;
        let compiled = compile(request, &schema, self.config.page(request))?;

        let count = connection
            .query(&compiled.count_sql, &compiled.count_params)
            .await?;
        let total_count = total_from(&count)?;

        let page = connection
            .query(&compiled.data_sql, &compiled.data_params)
            .await?;
        let response = materialize(page, compiled, &schema, total_count, started);

        tracing::info!(
            rows = response.data.len(),
            total = response.total_count,
            execution_time_ms = response.execution_time_ms,
            "table data fetched"
        );
        Ok(response)
    }
}

fn total_from(count: &QueryResult) -> ServiceResult<u64> {
    let value = count
        .scalar()
        .and_then(|v| v.as_i64())
        .ok_or_else(|| ServiceError::ExecutionError("COUNT query returned no value".into()))?;
    Ok(u64::try_from(value).unwrap_or(0))
}

fn materialize(
    page: QueryResult,
    compiled: CompiledQuery,
    schema: &[ColumnSchema],
    total_count: u64,
    started: Instant,
) -> TableDataResponse {
    let headers = if page.has_rows() {
        page.column_names()
    } else {
        compiled.expected_headers
    };

    let mut data: Vec<_> = page.rows.into_iter().map(|row| row.into_values()).collect();

    if compiled.mode == QueryMode::Rows {
        if let Some((column, order)) = &compiled.sort {
            if let Some(index) = headers.iter().position(|h| h == column) {
                normalize_rows(&mut data, index, *order);
            }
        }
    }

    let column_schema = schema
        .iter()
        .filter(|c| headers.contains(&c.name))
        .cloned()
        .collect();

    TableDataResponse {
        headers,
        data,
        total_count,
        column_schema,
        query_metadata: compiled.metadata,
        cached: false,
        execution_time_ms: started.elapsed().as_secs_f64() * 1000.0,
    }
}
