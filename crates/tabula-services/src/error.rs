//! Service layer error types

use serde::{Deserialize, Serialize};
use tabula_core::TabulaError;
use tabula_query::QueryError;
use tabula_schema::SchemaError;
use thiserror::Error;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to engine callers
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    SchemaError(String),

    #[error("{0}")]
    InvalidIdentifier(String),

    #[error("{0}")]
    NoValidColumns(String),

    #[error("Query execution failed: {0}")]
    ExecutionError(String),

    #[error("Connection failed: {0}")]
    ConnectionError(String),

    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    /// Stable kind name, used as the `error` field of [`ErrorResponse`]
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::SchemaError(_) => "SchemaError",
            ServiceError::InvalidIdentifier(_) => "InvalidIdentifier",
            ServiceError::NoValidColumns(_) => "NoValidColumns",
            ServiceError::ExecutionError(_) => "ExecutionError",
            ServiceError::ConnectionError(_) => "ConnectionError",
            ServiceError::ConfigurationError(_) => "ConfigurationError",
            ServiceError::InvalidRequest(_) => "InvalidRequest",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

/// Serialized form of a failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<QueryError> for ServiceError {
    fn from(error: QueryError) -> Self {
        match error {
            QueryError::InvalidIdentifier { .. } => {
                ServiceError::InvalidIdentifier(error.to_string())
            }
            QueryError::NoValidColumns { .. } => ServiceError::NoValidColumns(error.to_string()),
        }
    }
}

impl From<SchemaError> for ServiceError {
    fn from(error: SchemaError) -> Self {
        match error {
            SchemaError::TableNotFound(_) | SchemaError::NotSupported(_) => {
                ServiceError::SchemaError(error.to_string())
            }
            SchemaError::InvalidIdentifier(e) => e.into(),
            SchemaError::Database(e) => e.into(),
        }
    }
}

impl From<TabulaError> for ServiceError {
    fn from(error: TabulaError) -> Self {
        match error {
            TabulaError::Connection(_) | TabulaError::Io(_) => {
                ServiceError::ConnectionError(error.to_string())
            }
            TabulaError::Schema(_) | TabulaError::NotFound(_) => {
                ServiceError::SchemaError(error.to_string())
            }
            TabulaError::Configuration(_) | TabulaError::NotSupported(_) => {
                ServiceError::ConfigurationError(error.to_string())
            }
            TabulaError::Query(_) | TabulaError::Serialization(_) => {
                ServiceError::ExecutionError(error.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(error: serde_json::Error) -> Self {
        ServiceError::InvalidRequest(error.to_string())
    }
}
