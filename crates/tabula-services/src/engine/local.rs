//! In-process engine over a single open database

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tabula_core::Connection;
use tabula_driver_sqlite::SqliteConnection;
use tabula_query::TableDataRequest;
use tabula_schema::{SchemaCache, SchemaInspector};

use super::TableDataEngine;
use crate::config::EngineConfig;
use crate::error::ServiceResult;
use crate::table_service::TableService;
use crate::view_models::TableDataResponse;

/// Engine bound to one database handle.
///
/// Requests never hold the handle lock across I/O: they clone the current
/// handle and run against it, so a concurrent [`load`](Self::load) only
/// affects requests that start after it.
pub struct LocalEngine {
    connection: RwLock<Arc<dyn Connection>>,
    service: TableService,
}

impl LocalEngine {
    /// Open the database at `path`
    pub fn open(path: &str, config: EngineConfig) -> ServiceResult<Self> {
        let connection = SqliteConnection::open(path, config.open_options())?;
        let inspector = SchemaInspector::new(Arc::new(SchemaCache::default()));
        Ok(Self::with_connection(
            Arc::new(connection),
            TableService::new(inspector, config),
        ))
    }

    /// Engine over an existing handle, sharing `service`'s schema cache
    pub fn with_connection(connection: Arc<dyn Connection>, service: TableService) -> Self {
        Self {
            connection: RwLock::new(connection),
            service,
        }
    }

    /// Replace the loaded database with the one at `path`.
    ///
    /// Schema cached for the previous database is dropped. The previous
    /// handle is released once in-flight requests finish with it.
    #[tracing::instrument(skip(self))]
    pub fn load(&self, path: &str) -> ServiceResult<()> {
        let connection: Arc<dyn Connection> = Arc::new(SqliteConnection::open(
            path,
            self.service.config().open_options(),
        )?);

        let previous = std::mem::replace(&mut *self.connection.write(), connection);
        self.service
            .inspector()
            .cache()
            .invalidate(previous.identity());
        tracing::info!(previous = %previous.identity().location(), "database loaded");
        Ok(())
    }

    /// Handle for the currently loaded database
    pub fn connection(&self) -> Arc<dyn Connection> {
        self.connection.read().clone()
    }
}

#[async_trait]
impl TableDataEngine for LocalEngine {
    fn name(&self) -> &'static str {
        "local"
    }

    #[tracing::instrument(skip(self, request), fields(engine = "local", table = %request.table_name))]
    async fn table_data(&self, request: &TableDataRequest) -> ServiceResult<TableDataResponse> {
        let connection = self.connection();
        self.service.fetch_table_data(&*connection, request).await
    }
}
