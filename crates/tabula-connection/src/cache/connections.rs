//! Warm connection cache

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;
use tabula_core::{Connection, ConnectionConfig, DatabaseDriver, DatabaseIdentity, Result};
use tokio::task::JoinHandle;

use super::config::CacheConfig;
use super::stats::ConnectionCacheStats;

/// Factory trait for opening connections by database location
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    /// Current identity of the database at `location`, without opening it
    fn identify(&self, location: &str) -> Result<DatabaseIdentity>;

    /// Open a new connection
    async fn create(&self, location: &str) -> Result<Arc<dyn Connection>>;

    /// Validate that a connection is still usable
    async fn validate(&self, conn: &dyn Connection) -> bool {
        !conn.is_closed()
    }
}

#[async_trait]
impl<T: ConnectionFactory> ConnectionFactory for Arc<T> {
    fn identify(&self, location: &str) -> Result<DatabaseIdentity> {
        (**self).identify(location)
    }

    async fn create(&self, location: &str) -> Result<Arc<dyn Connection>> {
        (**self).create(location).await
    }

    async fn validate(&self, conn: &dyn Connection) -> bool {
        (**self).validate(conn).await
    }
}

/// Opens connections through a [`DatabaseDriver`]
pub struct DriverFactory {
    driver: Arc<dyn DatabaseDriver>,
    params: Vec<(String, String)>,
}

impl DriverFactory {
    pub fn new(driver: impl DatabaseDriver + 'static) -> Self {
        Self {
            driver: Arc::new(driver),
            params: Vec::new(),
        }
    }

    /// Extra connection parameter passed on every open
    pub fn with_param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    fn config(&self, location: &str) -> ConnectionConfig {
        let mut config = ConnectionConfig::new(self.driver.name());
        config.database = Some(location.to_string());
        for (key, value) in &self.params {
            config = config.with_param(key, value);
        }
        config
    }
}

#[async_trait]
impl ConnectionFactory for DriverFactory {
    fn identify(&self, location: &str) -> Result<DatabaseIdentity> {
        self.driver.identify(&self.config(location))
    }

    async fn create(&self, location: &str) -> Result<Arc<dyn Connection>> {
        self.driver.connect(&self.config(location)).await
    }
}

enum Lookup {
    Warm(Arc<dyn Connection>),
    Idle,
    Changed,
    Missing,
}

struct WarmConnection {
    connection: Arc<dyn Connection>,
    last_used_at: Instant,
}

impl WarmConnection {
    fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            last_used_at: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_used_at = Instant::now();
    }
}

/// Keeps one open connection per database location.
///
/// A cached handle is reused only while the database's identity is
/// unchanged, the handle is open, and it has been used within the idle
/// timeout. Otherwise it is replaced transparently. Concurrent callers
/// racing to open the same location each get a working handle; the last
/// one to finish is the one kept.
///
/// Replaced handles are dropped rather than closed so that requests still
/// holding them can finish.
pub struct ConnectionCache {
    config: CacheConfig,
    factory: Arc<dyn ConnectionFactory>,
    entries: Mutex<HashMap<String, WarmConnection>>,
    evicted: AtomicU64,
    reopened: AtomicU64,
}

impl ConnectionCache {
    pub fn new<F: ConnectionFactory>(config: CacheConfig, factory: F) -> Self {
        Self {
            config,
            factory: Arc::new(factory),
            entries: Mutex::new(HashMap::new()),
            evicted: AtomicU64::new(0),
            reopened: AtomicU64::new(0),
        }
    }

    /// Current identity of the database at `location`
    pub fn identify(&self, location: &str) -> Result<DatabaseIdentity> {
        self.factory.identify(location)
    }

    /// Get a usable connection for `location`, opening one if needed
    #[tracing::instrument(skip(self))]
    pub async fn acquire(&self, location: &str) -> Result<Arc<dyn Connection>> {
        let identity = self.factory.identify(location)?;

        let cached = {
            let mut entries = self.entries.lock();
            let lookup = match entries.get_mut(location) {
                Some(warm) if warm.last_used_at.elapsed() > self.config.idle_timeout() => {
                    Lookup::Idle
                }
                Some(warm) if warm.connection.identity() != &identity => Lookup::Changed,
                Some(warm) => {
                    warm.touch();
                    Lookup::Warm(warm.connection.clone())
                }
                None => Lookup::Missing,
            };
            match lookup {
                Lookup::Warm(connection) => Some(connection),
                Lookup::Idle => {
                    tracing::debug!("cached connection idle too long");
                    entries.remove(location);
                    self.evicted.fetch_add(1, Ordering::Relaxed);
                    None
                }
                Lookup::Changed => {
                    tracing::info!("database changed on disk, reopening");
                    entries.remove(location);
                    self.reopened.fetch_add(1, Ordering::Relaxed);
                    None
                }
                Lookup::Missing => None,
            }
        };

        if let Some(connection) = cached {
            if self.factory.validate(&*connection).await {
                tracing::trace!("reusing warm connection");
                return Ok(connection);
            }
            tracing::warn!("cached connection is no longer usable, reopening");
            self.remove_if_same(location, &connection);
            self.reopened.fetch_add(1, Ordering::Relaxed);
        }

        let connection = self.factory.create(location).await?;
        self.entries
            .lock()
            .insert(location.to_string(), WarmConnection::new(connection.clone()));
        Ok(connection)
    }

    fn remove_if_same(&self, location: &str, connection: &Arc<dyn Connection>) {
        let mut entries = self.entries.lock();
        let same = entries
            .get(location)
            .map(|warm| Arc::ptr_eq(&warm.connection, connection))
            .unwrap_or(false);
        if same {
            entries.remove(location);
        }
    }

    /// Drop every connection unused for longer than the idle timeout.
    /// Returns how many were dropped.
    pub fn evict_idle(&self) -> usize {
        let timeout = self.config.idle_timeout();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|location, warm| {
            let keep = warm.last_used_at.elapsed() <= timeout;
            if !keep {
                tracing::warn!(location = %location, "evicting idle connection");
            }
            keep
        });
        let evicted = before - entries.len();
        self.evicted.fetch_add(evicted as u64, Ordering::Relaxed);
        evicted
    }

    /// Close and forget every cached connection
    pub async fn close_all(&self) {
        let connections: Vec<_> = {
            let mut entries = self.entries.lock();
            entries.drain().map(|(_, warm)| warm.connection).collect()
        };

        tracing::info!(count = connections.len(), "closing cached connections");
        for connection in connections {
            if let Err(e) = connection.close().await {
                tracing::warn!(
                    location = %connection.identity().location(),
                    error = %e,
                    "failed to close cached connection"
                );
            }
        }
    }

    /// Run [`evict_idle`](Self::evict_idle) periodically until the cache is
    /// dropped. Returns `None` when the sweep interval is disabled.
    pub fn spawn_sweeper(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let period = self.config.sweep_interval()?;
        let cache: Weak<Self> = Arc::downgrade(self);

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(cache) = cache.upgrade() else {
                    tracing::debug!("connection cache dropped, stopping sweeper");
                    break;
                };
                let evicted = cache.evict_idle();
                if evicted > 0 {
                    tracing::debug!(evicted, "idle sweep finished");
                }
            }
        }))
    }

    pub fn stats(&self) -> ConnectionCacheStats {
        ConnectionCacheStats {
            open: self.entries.lock().len(),
            evicted: self.evicted.load(Ordering::Relaxed),
            reopened: self.reopened.load(Ordering::Relaxed),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}
