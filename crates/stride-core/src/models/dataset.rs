use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How far a restore of the local dataset got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreState {
    /// Nothing has ever been restored.
    #[default]
    Empty,
    /// A full reset started and has not completed.
    Resetting,
    Ready,
}

impl RestoreState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Resetting => "resetting",
            Self::Ready => "ready",
        }
    }
}

impl fmt::Display for RestoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestoreState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "empty" => Ok(Self::Empty),
            "resetting" => Ok(Self::Resetting),
            "ready" => Ok(Self::Ready),
            other => Err(format!("unknown restore state: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestoreMode {
    FullReset,
    Incremental,
}

impl RestoreMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullReset => "FULL_RESET",
            Self::Incremental => "INCREMENTAL",
        }
    }
}

impl fmt::Display for RestoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestoreMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FULL_RESET" => Ok(Self::FullReset),
            "INCREMENTAL" => Ok(Self::Incremental),
            other => Err(format!("unknown restore mode: {other}")),
        }
    }
}

/// Who the locally loaded dataset belongs to, and whether it can be trusted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalDatasetMarker {
    pub owner_user_id: Option<String>,
    pub schema_version: Option<u32>,
    pub restore_state: RestoreState,
    pub last_restore_mode: Option<RestoreMode>,
    pub last_restored_at: Option<DateTime<Utc>>,
}
