//! Request compilation.
//!
//! [`FilterCompiler`] produces the WHERE predicate, [`QueryBuilder`] wraps it
//! into a data statement and a COUNT statement that share the same filters.

mod builder;
mod filters;

#[cfg(test)]
mod tests;

pub use builder::{CompiledQuery, Page, QueryBuilder, QueryMetadata, QueryMode};
pub use filters::{ColumnAffinity, FilterCompiler, WhereClause};

use tabula_core::ColumnSchema;

use crate::{QueryResult, TableDataRequest};

/// Compile a request against a table's schema.
///
/// Free-text search only applies in row mode.
pub fn compile(
    request: &TableDataRequest,
    schema: &[ColumnSchema],
    page: Page,
) -> QueryResult<CompiledQuery> {
    let search = if request.is_aggregation() {
        None
    } else {
        request.search_term()
    };

    let where_clause =
        FilterCompiler::new(schema).compile(&request.col_filter, &request.filters, search)?;
    let compiled = QueryBuilder::new(schema).build(request, where_clause, page)?;

    tracing::debug!(
        table = %request.table_name,
        sql = %compiled.data_sql,
        params = compiled.data_params.len(),
        "compiled table request"
    );
    Ok(compiled)
}
