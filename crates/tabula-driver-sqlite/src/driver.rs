//! SQLite driver implementation

use async_trait::async_trait;
use std::sync::Arc;
use tabula_core::{
    Connection, ConnectionConfig, DatabaseDriver, DatabaseIdentity, Result, TabulaError,
};

use crate::{SqliteConnection, SqliteOpenOptions};

/// SQLite database driver
pub struct SqliteDriver {
    defaults: SqliteOpenOptions,
}

impl SqliteDriver {
    /// Create a new SQLite driver instance
    pub fn new() -> Self {
        Self::with_options(SqliteOpenOptions::default())
    }

    /// Create a driver whose connections use the given open options unless
    /// the connection config overrides them
    pub fn with_options(defaults: SqliteOpenOptions) -> Self {
        tracing::debug!(?defaults, "SQLite driver initialized");
        Self { defaults }
    }

    fn database_path(config: &ConnectionConfig) -> Result<String> {
        config
            .get_string("path")
            .or_else(|| config.get_string("database"))
            .ok_or_else(|| TabulaError::Configuration(
                "SQLite requires 'path' or 'database' parameter. Example: { \"path\": \"/path/to/database.db\" }".into()
            ))
    }

    fn open_options(&self, config: &ConnectionConfig) -> SqliteOpenOptions {
        SqliteOpenOptions {
            read_only: config
                .get_bool("read_only")
                .unwrap_or(self.defaults.read_only),
            case_sensitive_like: config
                .get_bool("case_sensitive_like")
                .unwrap_or(self.defaults.case_sensitive_like),
        }
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn display_name(&self) -> &'static str {
        "SQLite"
    }

    #[tracing::instrument(skip(self, config), fields(path = config.get_string("path").as_deref()))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let path = Self::database_path(config)?;

        let conn = SqliteConnection::open(&path, self.open_options(config)).map_err(|e| {
            tracing::error!(error = %e, "failed to connect to SQLite database");
            e
        })?;

        tracing::info!(path = %path, "SQLite connection created");
        Ok(Arc::new(conn))
    }

    fn identify(&self, config: &ConnectionConfig) -> Result<DatabaseIdentity> {
        let path = Self::database_path(config)?;
        if path == ":memory:" {
            return Err(TabulaError::NotSupported(
                "in-memory databases have no stable identity".into(),
            ));
        }
        DatabaseIdentity::of_file(SqliteConnection::expand_path(&path)?)
    }
}
