use thiserror::Error;

pub type QueryResult<T> = Result<T, QueryError>;

/// Why an identifier was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierRejection {
    /// Does not match `^[A-Za-z_][A-Za-z0-9_]*$`
    Pattern,
    /// Well-formed but not a column of the table
    NotInSchema,
    /// `*` used with an aggregate other than `count`
    Wildcard,
}

impl std::fmt::Display for IdentifierRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierRejection::Pattern => write!(f, "not a valid SQL identifier"),
            IdentifierRejection::NotInSchema => write!(f, "not a column of this table"),
            IdentifierRejection::Wildcard => write!(f, "'*' is only valid for count"),
        }
    }
}

/// Errors raised while compiling a request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid identifier '{identifier}': {reason}")]
    InvalidIdentifier {
        identifier: String,
        reason: IdentifierRejection,
    },

    #[error("None of the requested columns exist in table '{table}'")]
    NoValidColumns { table: String },
}

impl QueryError {
    pub(crate) fn invalid(identifier: &str, reason: IdentifierRejection) -> Self {
        QueryError::InvalidIdentifier {
            identifier: identifier.to_string(),
            reason,
        }
    }
}
