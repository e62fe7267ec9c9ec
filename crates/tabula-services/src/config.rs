//! Engine configuration
//!
//! Loaded from TOML. Every key is optional and falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tabula_connection::CacheConfig;
use tabula_driver_sqlite::SqliteOpenOptions;
use tabula_query::{Page, TableDataRequest};

use crate::error::{ServiceError, ServiceResult};

/// Tuning shared by both engines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size when a request omits `limit`
    pub default_limit: u64,
    /// Upper bound applied to a requested `limit`
    pub max_limit: u64,
    pub query_cache_enabled: bool,
    pub query_cache_ttl_secs: u64,
    pub query_cache_capacity: usize,
    pub connection_idle_timeout_secs: u64,
    /// Background sweep period; 0 leaves eviction to lookups
    pub sweep_interval_secs: u64,
    pub read_only: bool,
    pub case_sensitive_like: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 10_000,
            query_cache_enabled: true,
            query_cache_ttl_secs: 300,
            query_cache_capacity: 512,
            connection_idle_timeout_secs: 600,
            sweep_interval_secs: 60,
            read_only: true,
            case_sensitive_like: true,
        }
    }
}

impl EngineConfig {
    /// Read a TOML file
    pub fn load(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::ConfigurationError(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), ?config, "loaded engine config");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> ServiceResult<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| ServiceError::ConfigurationError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ServiceResult<()> {
        if self.max_limit == 0 {
            return Err(ServiceError::ConfigurationError(
                "max_limit must be greater than zero".into(),
            ));
        }
        if self.default_limit > self.max_limit {
            return Err(ServiceError::ConfigurationError(format!(
                "default_limit ({}) exceeds max_limit ({})",
                self.default_limit, self.max_limit
            )));
        }
        Ok(())
    }

    pub fn open_options(&self) -> SqliteOpenOptions {
        SqliteOpenOptions {
            read_only: self.read_only,
            case_sensitive_like: self.case_sensitive_like,
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(
            self.connection_idle_timeout_secs.saturating_mul(1000),
            self.query_cache_ttl_secs.saturating_mul(1000),
        )
        .with_sweep_interval_ms(self.sweep_interval_secs.saturating_mul(1000))
        .with_query_capacity(self.query_cache_capacity)
    }

    /// Page window for a request: default limit when absent, clamped to
    /// `max_limit`, offset 0 when absent
    pub fn page(&self, request: &TableDataRequest) -> Page {
        let limit = request
            .limit
            .unwrap_or(self.default_limit)
            .min(self.max_limit);
        Page::new(limit, request.offset.unwrap_or(0))
    }
}
