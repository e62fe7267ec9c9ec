//! SELECT and COUNT statement assembly

use serde::{Deserialize, Serialize};
use tabula_core::{ColumnSchema, Value};

use crate::compiler::WhereClause;
use crate::identifier::{IdentifierGuard, quote_identifier, validate_identifier};
use crate::{
    AggregateFunction, Aggregation, IdentifierRejection, QueryError, QueryResult, SortOrder,
    TableDataRequest,
};

/// Resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }

    fn params(&self) -> [Value; 2] {
        [
            Value::Int64(i64::try_from(self.limit).unwrap_or(i64::MAX)),
            Value::Int64(i64::try_from(self.offset).unwrap_or(i64::MAX)),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Rows,
    Aggregation,
}

/// Description of a compiled request, returned to callers for debugging
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMetadata {
    pub sql: String,
    pub filters_applied: usize,
    pub has_search: bool,
    pub has_sort: bool,
    pub has_group_by: bool,
    pub has_aggregations: bool,
}

/// Statements and parameters ready for execution
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub data_sql: String,
    pub data_params: Vec<Value>,
    pub count_sql: String,
    pub count_params: Vec<Value>,
    /// Output column names, used when the data statement returns no rows
    pub expected_headers: Vec<String>,
    pub mode: QueryMode,
    /// Validated sort column and direction (row mode only)
    pub sort: Option<(String, SortOrder)>,
    pub metadata: QueryMetadata,
}

/// Builds statements for one table
pub struct QueryBuilder<'a> {
    schema: &'a [ColumnSchema],
    guard: IdentifierGuard<'a>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(schema: &'a [ColumnSchema]) -> Self {
        Self {
            schema,
            guard: IdentifierGuard::for_schema(schema),
        }
    }

    pub fn build(
        &self,
        request: &TableDataRequest,
        where_clause: WhereClause,
        page: Page,
    ) -> QueryResult<CompiledQuery> {
        let table = quote_identifier(&request.table_name)?;
        if request.is_aggregation() {
            self.build_aggregation(request, &table, where_clause, page)
        } else {
            self.build_rows(request, &table, where_clause, page)
        }
    }

    fn build_rows(
        &self,
        request: &TableDataRequest,
        table: &str,
        where_clause: WhereClause,
        page: Page,
    ) -> QueryResult<CompiledQuery> {
        let (projection, expected_headers) = self.projection(request)?;
        let where_sql = where_clause.to_sql();

        let sort = match request.sort_column() {
            Some(column) => Some((self.guard.validate(column)?.to_string(), request.sort_order)),
            None => None,
        };
        let order_by = match &sort {
            Some((column, order)) => {
                let quoted = format!("\"{}\"", column);
                format!(
                    " ORDER BY {}, {} COLLATE NOCASE {}",
                    emptiness_key(&quoted),
                    quoted,
                    order.as_sql()
                )
            }
            None => String::new(),
        };

        let data_sql = format!(
            "SELECT {} FROM {}{}{} LIMIT ? OFFSET ?",
            projection, table, where_sql, order_by
        );
        let count_sql = format!("SELECT COUNT(*) FROM {}{}", table, where_sql);

        let count_params = where_clause.params.clone();
        let mut data_params = where_clause.params;
        data_params.extend(page.params());

        Ok(CompiledQuery {
            metadata: QueryMetadata {
                sql: data_sql.clone(),
                filters_applied: where_clause.filters_applied,
                has_search: where_clause.has_search,
                has_sort: sort.is_some(),
                has_group_by: false,
                has_aggregations: false,
            },
            data_sql,
            data_params,
            count_sql,
            count_params,
            expected_headers,
            mode: QueryMode::Rows,
            sort,
        })
    }

    /// Column list for row mode and the headers it will produce
    fn projection(&self, request: &TableDataRequest) -> QueryResult<(String, Vec<String>)> {
        let requested = match &request.columns {
            Some(columns) if !columns.is_empty() => columns,
            _ => {
                let headers = self.schema.iter().map(|c| c.name.clone()).collect();
                return Ok(("*".to_string(), headers));
            }
        };

        let mut kept = Vec::with_capacity(requested.len());
        for column in requested {
            match self.guard.validate(column) {
                Ok(column) => kept.push(column.to_string()),
                Err(e) => tracing::warn!(error = %e, "dropping requested column"),
            }
        }

        if kept.is_empty() {
            return Err(QueryError::NoValidColumns {
                table: request.table_name.clone(),
            });
        }

        let projection = kept
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ");
        Ok((projection, kept))
    }

    fn build_aggregation(
        &self,
        request: &TableDataRequest,
        table: &str,
        where_clause: WhereClause,
        page: Page,
    ) -> QueryResult<CompiledQuery> {
        let mut group_columns = Vec::with_capacity(request.group_by.len());
        for column in &request.group_by {
            group_columns.push(self.guard.quote(column)?);
        }

        let mut select_list = group_columns.clone();
        let mut expected_headers = request.group_by.clone();
        for aggregation in &request.aggregations {
            let expression = self.aggregate_expression(aggregation)?;
            let alias = aggregation.output_name();
            validate_identifier(&alias)?;
            select_list.push(format!("{} AS \"{}\"", expression, alias));
            expected_headers.push(alias);
        }

        let mut grouped = format!(
            "SELECT {} FROM {}{}",
            select_list.join(", "),
            table,
            where_clause.to_sql()
        );
        let mut order_by = String::new();
        if !group_columns.is_empty() {
            grouped.push_str(&format!(" GROUP BY {}", group_columns.join(", ")));
            order_by = format!(" ORDER BY {}", group_columns.join(", "));
        }

        let data_sql = format!("{}{} LIMIT ? OFFSET ?", grouped, order_by);
        let count_sql = format!("SELECT COUNT(*) FROM ({})", grouped);

        let count_params = where_clause.params.clone();
        let mut data_params = where_clause.params;
        data_params.extend(page.params());

        Ok(CompiledQuery {
            metadata: QueryMetadata {
                sql: data_sql.clone(),
                filters_applied: where_clause.filters_applied,
                has_search: false,
                has_sort: false,
                has_group_by: !group_columns.is_empty(),
                has_aggregations: true,
            },
            data_sql,
            data_params,
            count_sql,
            count_params,
            expected_headers,
            mode: QueryMode::Aggregation,
            sort: None,
        })
    }

    fn aggregate_expression(&self, aggregation: &Aggregation) -> QueryResult<String> {
        if aggregation.column == "*" {
            return match aggregation.function {
                AggregateFunction::Count => Ok("COUNT(*)".to_string()),
                _ => Err(QueryError::invalid("*", IdentifierRejection::Wildcard)),
            };
        }

        let c = self.guard.quote(&aggregation.column)?;
        Ok(match aggregation.function {
            AggregateFunction::Count => format!("COUNT({})", c),
            AggregateFunction::Sum => format!("SUM({})", c),
            AggregateFunction::Avg => format!("AVG({})", c),
            AggregateFunction::Min => format!("MIN({})", c),
            AggregateFunction::Max => format!("MAX({})", c),
            AggregateFunction::DistinctCount => format!("COUNT(DISTINCT {})", c),
            // Population variance identity; SQLite has no STDDEV/VARIANCE and
            // this form loses precision for large values with small spread.
            AggregateFunction::Stddev | AggregateFunction::Variance => {
                format!("(AVG({c} * {c}) - AVG({c}) * AVG({c}))", c = c)
            }
        })
    }
}

/// `1` for values the sort normalizer treats as empty, else `0`.
///
/// Placed ahead of the requested ORDER BY so empty cells land on the last
/// pages in both directions.
fn emptiness_key(quoted: &str) -> String {
    let trimmed = format!("TRIM(CAST({} AS TEXT), {})", quoted, WHITESPACE);
    format!(
        "CASE WHEN {c} IS NULL OR {t} = '' \
         OR LOWER({t}) IN ('null', 'undefined', '-') \
         THEN 1 ELSE 0 END",
        c = quoted,
        t = trimmed
    )
}

/// ASCII whitespace, matching what `str::trim` strips from cell text
const WHITESPACE: &str = "' ' || char(9, 10, 11, 12, 13)";
