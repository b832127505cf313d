use serde::{Deserialize, Serialize};

use super::defaults;

/// Circuit breaker thresholds. `failed_after` must exceed `degraded_after`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before `healthy -> degraded`.
    pub degraded_after: u32,
    /// Consecutive failures before dispatch is suspended.
    pub failed_after: u32,
    pub cooldown_base_ms: u64,
    pub cooldown_max_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            degraded_after: defaults::DEFAULT_DEGRADED_AFTER,
            failed_after: defaults::DEFAULT_FAILED_AFTER,
            cooldown_base_ms: defaults::DEFAULT_BREAKER_COOLDOWN_BASE_MS,
            cooldown_max_ms: defaults::DEFAULT_BREAKER_COOLDOWN_MAX_MS,
        }
    }
}
