use tabula_core::TabulaError;
use tabula_query::QueryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Table '{0}' does not exist")]
    TableNotFound(String),

    #[error(transparent)]
    InvalidIdentifier(#[from] QueryError),

    #[error("Driver '{0}' does not support schema introspection")]
    NotSupported(String),

    #[error(transparent)]
    Database(#[from] TabulaError),
}
