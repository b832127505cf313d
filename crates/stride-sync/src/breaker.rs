//! Circuit breaker transitions over [`EngineState`].
//!
//! `healthy -> degraded` after `degraded_after` consecutive failures,
//! `degraded -> failed` after `failed_after`, any state back to `healthy`
//! on the next success. These functions only compute; the dispatcher task
//! is the sole caller and the sole writer of the persisted state.

use chrono::{DateTime, Utc};

use stride_core::config::BreakerConfig;
use stride_core::models::{EngineState, EngineStatus, NetworkState};

use crate::backoff::breaker_cooldown;
use crate::time::after;

pub fn on_success(state: &mut EngineState) {
    if state.status != EngineStatus::Healthy {
        tracing::info!(
            previous = %state.status,
            failures = state.consecutive_failures,
            "sync engine recovered"
        );
    }
    state.status = EngineStatus::Healthy;
    state.consecutive_failures = 0;
    state.backoff_until = None;
}

pub fn on_failure(state: &mut EngineState, now: DateTime<Utc>, config: &BreakerConfig) {
    state.consecutive_failures = state.consecutive_failures.saturating_add(1);
    state.last_failure_at = Some(now);

    let failures = state.consecutive_failures;
    let next = if failures >= config.failed_after {
        EngineStatus::Failed
    } else if failures >= config.degraded_after {
        EngineStatus::Degraded
    } else {
        state.status
    };

    if next == EngineStatus::Failed {
        let cooldown = breaker_cooldown(failures, config);
        let until = after(now, cooldown);
        state.backoff_until = Some(until);
        tracing::warn!(failures, until = %until, "circuit breaker open, dispatch suspended");
    } else if next != state.status {
        tracing::warn!(failures, status = %next, "sync engine degraded");
    }
    state.status = next;
}

/// Record a network transition. Returns true when connectivity came back
/// from `offline`; the breaker cooldown is dropped so the dispatcher can
/// try immediately.
pub fn on_network_change(state: &mut EngineState, network: NetworkState, now: DateTime<Utc>) -> bool {
    let previous = state.network_state;
    if previous == network {
        return false;
    }
    state.network_state = network;
    state.last_network_change = Some(now);

    let reconnected = !previous.is_reachable() && network.is_reachable();
    if reconnected {
        state.backoff_until = None;
    }
    tracing::info!(from = %previous, to = %network, "network state changed");
    reconnected
}
