//! Tabula Query - compiles declarative table requests into parameterized SQL
//!
//! Nothing in this crate touches a database. It turns a [`TableDataRequest`]
//! plus the table's [`ColumnSchema`](tabula_core::ColumnSchema) into a
//! [`CompiledQuery`]: a data statement, a matching COUNT statement, their
//! bound parameters and a description of what was compiled.
//!
//! - [`identifier`] - the only gate through which names reach SQL text
//! - [`compiler`] - filter compilation and SELECT/COUNT assembly
//! - [`sort`] - null-aware ordering applied to fetched pages

mod error;
pub mod compiler;
pub mod identifier;
mod request;
pub mod sort;

pub use compiler::{
    ColumnAffinity, CompiledQuery, FilterCompiler, Page, QueryBuilder, QueryMetadata, QueryMode,
    WhereClause, compile,
};
pub use error::{IdentifierRejection, QueryError, QueryResult};
pub use identifier::{IdentifierGuard, quote_identifier, validate_identifier};
pub use sort::{compare_values, is_empty_value, normalize_rows};
pub use request::{
    AdvancedFilter, AggregateFunction, Aggregation, FilterLogic, Operator, SortOrder,
    TableDataRequest,
};
