//! Top-level Stride configuration with layered resolution.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{BreakerConfig, DispatchConfig, QueueConfig, ReconcileConfig, StorageConfig};
use crate::errors::ConfigError;
use crate::models::TableSyncConfig;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`STRIDE_*`)
/// 2. Config file (`stride.toml`)
/// 3. Compiled defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StrideConfig {
    pub storage: StorageConfig,
    pub queue: QueueConfig,
    pub dispatch: DispatchConfig,
    pub breaker: BreakerConfig,
    pub reconcile: ReconcileConfig,
}

impl StrideConfig {
    /// Load configuration from an optional TOML file, then apply env overrides
    /// and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing and embedding).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Apply `STRIDE_*` environment variables. Unparseable values are ignored
    /// with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("STRIDE_DB_PATH") {
            self.storage.db_path = path;
        }
        env_override("STRIDE_MAX_RETRIES", &mut self.queue.max_retries);
        env_override("STRIDE_BACKOFF_BASE_MS", &mut self.dispatch.backoff_base_ms);
        env_override("STRIDE_BACKOFF_MAX_MS", &mut self.dispatch.backoff_max_ms);
        env_override("STRIDE_APPLY_TIMEOUT_MS", &mut self.dispatch.apply_timeout_ms);
        env_override("STRIDE_DEGRADED_AFTER", &mut self.breaker.degraded_after);
        env_override("STRIDE_FAILED_AFTER", &mut self.breaker.failed_after);
        env_override("STRIDE_PAGE_SIZE", &mut self.reconcile.page_size);
        env_override("STRIDE_PAGE_TIMEOUT_MS", &mut self.reconcile.page_timeout_ms);
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.db_path.trim().is_empty() {
            return Err(invalid("storage.db_path", "must not be empty"));
        }
        if self.queue.max_retries == 0 {
            return Err(invalid("queue.max_retries", "must be greater than 0"));
        }
        if self.dispatch.backoff_base_ms == 0 {
            return Err(invalid("dispatch.backoff_base_ms", "must be greater than 0"));
        }
        if self.dispatch.backoff_max_ms < self.dispatch.backoff_base_ms {
            return Err(invalid(
                "dispatch.backoff_max_ms",
                "must be at least dispatch.backoff_base_ms",
            ));
        }
        if self.dispatch.apply_timeout_ms == 0 {
            return Err(invalid("dispatch.apply_timeout_ms", "must be greater than 0"));
        }
        if self.breaker.degraded_after == 0 {
            return Err(invalid("breaker.degraded_after", "must be greater than 0"));
        }
        if self.breaker.failed_after <= self.breaker.degraded_after {
            return Err(invalid(
                "breaker.failed_after",
                "must be greater than breaker.degraded_after",
            ));
        }
        if self.reconcile.page_size == 0 {
            return Err(invalid("reconcile.page_size", "must be greater than 0"));
        }
        if self.reconcile.table_max_attempts == 0 {
            return Err(invalid("reconcile.table_max_attempts", "must be greater than 0"));
        }
        validate_table_order(&self.reconcile.tables)
    }
}

/// Tables must be unique and every parent must appear before its children.
pub fn validate_table_order(tables: &[TableSyncConfig]) -> Result<(), ConfigError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for table in tables {
        if table.table.trim().is_empty() {
            return Err(invalid("reconcile.tables.table", "must not be empty"));
        }
        if table.recency_column.trim().is_empty() {
            return Err(invalid(
                "reconcile.tables.recency_column",
                &format!("missing for table {}", table.table),
            ));
        }
        for parent in &table.depends_on {
            if !seen.contains(parent.as_str()) {
                return Err(invalid(
                    "reconcile.tables.depends_on",
                    &format!(
                        "table {} depends on {parent}, which is not listed before it",
                        table.table
                    ),
                ));
            }
        }
        if !seen.insert(table.table.as_str()) {
            return Err(invalid(
                "reconcile.tables.table",
                &format!("duplicate table {}", table.table),
            ));
        }
    }
    Ok(())
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn env_override<T: FromStr>(key: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        match raw.parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!(key, value = %raw, "ignoring unparseable config override"),
        }
    }
}
