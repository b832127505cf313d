use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Dispatcher timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// First retry delay; doubles on each further retry.
    pub backoff_base_ms: u64,
    /// Upper bound for a single entry's retry delay.
    pub backoff_max_ms: u64,
    /// Deadline for one applier call.
    pub apply_timeout_ms: u64,
    /// Periodic wake while idle.
    pub idle_wake_ms: u64,
}

impl DispatchConfig {
    pub fn apply_timeout(&self) -> Duration {
        Duration::from_millis(self.apply_timeout_ms)
    }

    pub fn idle_wake(&self) -> Duration {
        Duration::from_millis(self.idle_wake_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            backoff_base_ms: defaults::DEFAULT_BACKOFF_BASE_MS,
            backoff_max_ms: defaults::DEFAULT_BACKOFF_MAX_MS,
            apply_timeout_ms: defaults::DEFAULT_APPLY_TIMEOUT_MS,
            idle_wake_ms: defaults::DEFAULT_IDLE_WAKE_MS,
        }
    }
}
