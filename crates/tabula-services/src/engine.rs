//! Table data engines
//!
//! Two engines answer the same requests and must produce the same responses:
//!
//! - [`LocalEngine`] holds one database open in-process and can swap it for
//!   another with [`LocalEngine::load`].
//! - [`ServiceEngine`] serves a database location through shared caches:
//!   warm connections, memoized responses and per-identity schemas.

mod local;
mod service;

pub use local::LocalEngine;
pub use service::{EngineCaches, ServiceEngine};

use async_trait::async_trait;
use tabula_query::TableDataRequest;

use crate::error::{ErrorResponse, ServiceError, ServiceResult};
use crate::view_models::TableDataResponse;

/// Anything that turns a [`TableDataRequest`] into a page of data
#[async_trait]
pub trait TableDataEngine: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn table_data(&self, request: &TableDataRequest) -> ServiceResult<TableDataResponse>;

    /// Parse a JSON request, run it, and serialize either the response or an
    /// [`ErrorResponse`]
    async fn handle_json(&self, body: &str) -> String {
        let result = match serde_json::from_str::<TableDataRequest>(body) {
            Ok(request) => self.table_data(&request).await,
            Err(e) => Err(ServiceError::from(e)),
        };

        let encoded = match result {
            Ok(response) => serde_json::to_string(&response),
            Err(e) => {
                tracing::warn!(engine = self.name(), kind = e.kind(), error = %e, "request failed");
                serde_json::to_string(&e.to_response())
            }
        };
        encoded.unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to encode response");
            encode_fallback(&e.to_string())
        })
    }
}

fn encode_fallback(message: &str) -> String {
    let response = ErrorResponse {
        error: "ExecutionError".into(),
        message: message.to_string(),
    };
    serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"error":"ExecutionError","message":""}"#.to_string())
}
