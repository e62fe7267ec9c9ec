//! Identifier validation and quoting.
//!
//! Table, column and alias names can only be interpolated into SQL text after
//! passing through this module. Values never are; they are always bound.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tabula_core::ColumnSchema;

use crate::{IdentifierRejection, QueryError, QueryResult};

static IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Check that `identifier` is a plain SQL identifier
pub fn validate_identifier(identifier: &str) -> QueryResult<&str> {
    if IDENTIFIER_PATTERN.is_match(identifier) {
        Ok(identifier)
    } else {
        Err(QueryError::invalid(identifier, IdentifierRejection::Pattern))
    }
}

/// Validate and double-quote an identifier
pub fn quote_identifier(identifier: &str) -> QueryResult<String> {
    validate_identifier(identifier).map(|id| format!("\"{}\"", id))
}

/// Accepts only the columns of one table's schema
#[derive(Debug, Clone)]
pub struct IdentifierGuard<'a> {
    allowed: HashSet<&'a str>,
}

impl<'a> IdentifierGuard<'a> {
    pub fn new(columns: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            allowed: columns.into_iter().collect(),
        }
    }

    pub fn for_schema(schema: &'a [ColumnSchema]) -> Self {
        Self::new(schema.iter().map(|c| c.name.as_str()))
    }

    pub fn contains(&self, column: &str) -> bool {
        self.allowed.contains(column)
    }

    /// Pattern check followed by schema membership
    pub fn validate<'c>(&self, column: &'c str) -> QueryResult<&'c str> {
        validate_identifier(column)?;
        if !self.contains(column) {
            return Err(QueryError::invalid(column, IdentifierRejection::NotInSchema));
        }
        Ok(column)
    }

    /// Validate a column and return its quoted form
    pub fn quote(&self, column: &str) -> QueryResult<String> {
        self.validate(column).map(|c| format!("\"{}\"", c))
    }
}
