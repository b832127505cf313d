use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::TableSyncConfig;

/// Login-time reconciliation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Local schema version; a stored marker with another version forces a full reset.
    pub schema_version: u32,
    pub page_size: usize,
    pub page_timeout_ms: u64,
    /// Attempts per table before reconciliation gives up.
    pub table_max_attempts: u32,
    pub table_backoff_base_ms: u64,
    pub table_backoff_max_ms: u64,
    /// Deadline for the forced drain offered by the queue gate.
    pub drain_timeout_ms: u64,
    /// Tables in dependency order, parents first.
    pub tables: Vec<TableSyncConfig>,
}

impl ReconcileConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            page_size: defaults::DEFAULT_PAGE_SIZE,
            page_timeout_ms: defaults::DEFAULT_PAGE_TIMEOUT_MS,
            table_max_attempts: defaults::DEFAULT_TABLE_MAX_ATTEMPTS,
            table_backoff_base_ms: defaults::DEFAULT_TABLE_BACKOFF_BASE_MS,
            table_backoff_max_ms: defaults::DEFAULT_TABLE_BACKOFF_MAX_MS,
            drain_timeout_ms: defaults::DEFAULT_DRAIN_TIMEOUT_MS,
            tables: Vec::new(),
        }
    }
}
