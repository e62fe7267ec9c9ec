//! Database driver trait definition

use crate::{Connection, Result, TabulaError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Unique identifier
    pub id: uuid::Uuid,
    /// Driver ID (e.g., "sqlite")
    pub driver: String,
    /// Database file path
    pub database: Option<String>,
    /// Additional connection parameters
    pub params: HashMap<String, String>,
}

impl ConnectionConfig {
    /// Create a new configuration with default values
    pub fn new(driver: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            driver: driver.to_string(),
            database: None,
            params: HashMap::new(),
        }
    }

    /// Create a SQLite configuration
    pub fn new_sqlite(database_path: &str) -> Self {
        let mut config = Self::new("sqlite");
        config.database = Some(database_path.to_string());
        config
    }

    /// Set a connection parameter
    pub fn with_param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// Get a string parameter, falling back to the `database` field for `path`/`database`
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.params.get(key).cloned().or_else(|| match key {
            "path" | "database" => self.database.clone(),
            _ => None,
        })
    }

    /// Get a boolean parameter (`true`/`1`/`on`, case-insensitive)
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.params
            .get(key)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "on" | "yes"))
    }
}

/// Identity of a loaded database.
///
/// Two identities are equal only if they name the same location *and* the
/// underlying file has not been replaced or modified in between. Cached
/// schemas and warm connections are tied to an identity and discarded when
/// it changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseIdentity {
    location: String,
    size_bytes: Option<u64>,
    modified_nanos: Option<u128>,
}

impl DatabaseIdentity {
    /// Identity for a database file on disk
    pub fn of_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| {
            TabulaError::Connection(format!("Cannot stat database '{}': {}", path.display(), e))
        })?;
        let modified_nanos = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos());

        Ok(Self {
            location: path.to_string_lossy().to_string(),
            size_bytes: Some(metadata.len()),
            modified_nanos,
        })
    }

    /// Identity for an in-memory database; every call yields a distinct identity
    pub fn in_memory() -> Self {
        Self {
            location: format!(":memory:{}", uuid::Uuid::new_v4()),
            size_bytes: None,
            modified_nanos: None,
        }
    }

    /// The path (or in-memory tag) this identity refers to
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Stable string form, used as a cache key component
    pub fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}",
            self.location,
            self.size_bytes.map(|s| s.to_string()).unwrap_or_default(),
            self.modified_nanos.map(|m| m.to_string()).unwrap_or_default()
        )
    }

    /// Last modification time, if known
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified_nanos
            .and_then(|n| u64::try_from(n).ok())
            .map(|n| UNIX_EPOCH + std::time::Duration::from_nanos(n))
    }
}

/// A database driver
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Driver identifier (e.g., "sqlite")
    fn name(&self) -> &'static str;

    /// Human readable name
    fn display_name(&self) -> &'static str;

    /// Open a new connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;

    /// Compute the current identity of the database a config points at,
    /// without opening it
    fn identify(&self, config: &ConnectionConfig) -> Result<DatabaseIdentity>;
}
