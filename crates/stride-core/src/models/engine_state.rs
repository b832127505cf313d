use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health of the dispatch pipeline as seen by the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    #[default]
    Healthy,
    /// Repeated failures; entries still dispatch on their own backoff.
    Degraded,
    /// Dispatch suspended until `backoff_until`.
    Failed,
}

impl EngineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "healthy" => Ok(Self::Healthy),
            "degraded" => Ok(Self::Degraded),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown engine status: {other}")),
        }
    }
}

/// Connectivity as reported by the host's network observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkState {
    #[default]
    Online,
    Offline,
    Poor,
}

impl NetworkState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Poor => "poor",
        }
    }

    pub fn is_reachable(self) -> bool {
        !matches!(self, Self::Offline)
    }
}

impl fmt::Display for NetworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            "poor" => Ok(Self::Poor),
            other => Err(format!("unknown network state: {other}")),
        }
    }
}

/// Process-wide engine state. Persisted as a singleton row and owned by the
/// dispatcher task; everyone else sees snapshots.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineState {
    pub status: EngineStatus,
    pub consecutive_failures: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub backoff_until: Option<DateTime<Utc>>,
    pub network_state: NetworkState,
    pub last_network_change: Option<DateTime<Utc>>,
}

impl EngineState {
    /// Dispatch is attempted only when the network is reachable and any
    /// breaker cooldown has elapsed.
    pub fn may_dispatch(&self, now: DateTime<Utc>) -> bool {
        self.network_state.is_reachable() && self.backoff_until.map_or(true, |until| now >= until)
    }
}
