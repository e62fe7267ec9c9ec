//! Service-side engine with warm connections and response memoization

use async_trait::async_trait;
use std::sync::Arc;
use tabula_connection::{
    CacheStats, ConnectionCache, ConnectionCacheStats, DriverFactory, QueryCache, QueryKey,
};
use tabula_driver_sqlite::SqliteDriver;
use tabula_query::TableDataRequest;
use tabula_schema::{SchemaCache, SchemaInspector};
use tokio::task::JoinHandle;

use super::TableDataEngine;
use crate::config::EngineConfig;
use crate::error::ServiceResult;
use crate::table_service::TableService;
use crate::view_models::TableDataResponse;

/// Caches an engine works through. Engines serving different databases may
/// share one set.
#[derive(Clone)]
pub struct EngineCaches {
    pub connections: Arc<ConnectionCache>,
    pub queries: Arc<QueryCache<TableDataResponse>>,
    pub schemas: Arc<SchemaCache>,
}

impl EngineCaches {
    /// SQLite-backed caches tuned by `config`
    pub fn new(config: &EngineConfig) -> Self {
        let cache_config = config.cache_config();
        let factory = DriverFactory::new(SqliteDriver::with_options(config.open_options()));
        Self {
            connections: Arc::new(ConnectionCache::new(cache_config.clone(), factory)),
            queries: Arc::new(QueryCache::new(cache_config)),
            schemas: Arc::new(SchemaCache::default()),
        }
    }
}

/// Engine serving one database location.
///
/// A response is memoized against the database's identity at the time it
/// was computed, so a file rewritten on disk stops matching earlier entries.
pub struct ServiceEngine {
    database: String,
    caches: EngineCaches,
    service: TableService,
    sweeper: Option<JoinHandle<()>>,
}

impl ServiceEngine {
    pub fn new(database: impl Into<String>, config: EngineConfig) -> Self {
        let caches = EngineCaches::new(&config);
        Self::with_caches(database, caches, config)
    }

    /// Engine over caches shared with other engines.
    ///
    /// When called inside a tokio runtime the idle-connection sweeper is
    /// started; it stops when the engine is dropped.
    pub fn with_caches(
        database: impl Into<String>,
        caches: EngineCaches,
        config: EngineConfig,
    ) -> Self {
        let sweeper = match tokio::runtime::Handle::try_current() {
            Ok(_) => caches.connections.spawn_sweeper(),
            Err(_) => None,
        };
        let inspector = SchemaInspector::new(caches.schemas.clone());
        Self {
            database: database.into(),
            service: TableService::new(inspector, config),
            caches,
            sweeper,
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn caches(&self) -> &EngineCaches {
        &self.caches
    }

    pub fn query_cache_stats(&self) -> CacheStats {
        self.caches.queries.stats()
    }

    pub fn connection_stats(&self) -> ConnectionCacheStats {
        self.caches.connections.stats()
    }

    /// Forget memoized responses for this engine's database
    pub fn invalidate(&self) -> usize {
        match self.caches.connections.identify(&self.database) {
            Ok(identity) => self.caches.queries.invalidate_database(identity.location()),
            Err(_) => self.caches.queries.invalidate_database(&self.database),
        }
    }

    /// Close warm connections and stop the sweeper
    pub async fn shutdown(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
        self.caches.connections.close_all().await;
    }

    fn cache_enabled(&self) -> bool {
        self.service.config().query_cache_enabled
    }
}

impl Drop for ServiceEngine {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

#[async_trait]
impl TableDataEngine for ServiceEngine {
    fn name(&self) -> &'static str {
        "service"
    }

    #[tracing::instrument(skip(self, request), fields(engine = "service", table = %request.table_name))]
    async fn table_data(&self, request: &TableDataRequest) -> ServiceResult<TableDataResponse> {
        let canonical = serde_json::to_string(request)?;

        if self.cache_enabled() {
            let identity = self.caches.connections.identify(&self.database)?;
            let key = QueryKey::new(identity, canonical.clone());
            if let Some(mut response) = self.caches.queries.get(&key) {
                tracing::debug!("serving memoized response");
                response.cached = true;
                return Ok(response);
            }
        }

        let connection = self.caches.connections.acquire(&self.database).await?;
        let response = self
            .service
            .fetch_table_data(&*connection, request)
            .await?;

        if self.cache_enabled() {
            let key = QueryKey::new(connection.identity().clone(), canonical);
            self.caches.queries.insert(key, response.clone());
        }
        Ok(response)
    }
}
