use serde::{Deserialize, Serialize};

use super::defaults;

/// Mutation queue configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Retry budget stamped on every new entry.
    pub max_retries: u32,
    /// Completed entries older than this are swept.
    pub completed_retention_days: u32,
    /// Failed entries older than this are swept.
    pub failed_retention_days: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::DEFAULT_MAX_RETRIES,
            completed_retention_days: defaults::DEFAULT_COMPLETED_RETENTION_DAYS,
            failed_retention_days: defaults::DEFAULT_FAILED_RETENTION_DAYS,
        }
    }
}
