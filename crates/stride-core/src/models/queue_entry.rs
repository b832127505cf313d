use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a queued mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl EntryStatus {
    pub const ALL: [EntryStatus; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// `completed` and `failed` entries are never picked up by the dispatch loop.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Statuses that still represent unsynced user data.
    pub fn is_unsynced(self) -> bool {
        !matches!(self, Self::Completed)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown entry status: {other}")),
        }
    }
}

/// One pending or historical mutation in the durable queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Stable identifier; also handed to appliers as the idempotency key.
    pub id: String,
    /// Local insertion sequence, tie-breaker for equal `created_at`.
    pub seq: i64,
    /// User that was active when the mutation was enqueued.
    pub user_id: String,
    pub mutation_code: String,
    /// Serialized payload, meaningful only to the applier for `mutation_code`.
    pub payload: serde_json::Value,
    pub status: EntryStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub error_message: Option<String>,
    /// Not eligible for dispatch before this instant.
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.status == EntryStatus::Pending && self.scheduled_at <= now
    }

    /// Whether one more failure exhausts the retry budget.
    pub fn is_last_attempt(&self) -> bool {
        self.retry_count + 1 >= self.max_retries
    }
}

/// Aggregate queue counts, the "N changes pending sync" view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
}

impl QueueStats {
    /// Entries that have not reached the backend yet.
    pub fn unsynced(&self) -> u64 {
        self.pending + self.processing + self.failed
    }

    pub fn total(&self) -> u64 {
        self.pending + self.processing + self.completed + self.failed
    }
}
