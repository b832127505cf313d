use serde::{Deserialize, Serialize};

use super::RestoreMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePhase {
    /// Local rows of the table are being deleted (full reset only).
    Wiping,
    /// Remote pages are being installed.
    Restoring,
    /// A table pass failed and is about to be retried.
    Retrying { attempt: u32 },
    TableCompleted,
    TableFailed,
}

/// One progress notification emitted during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileProgress {
    pub mode: RestoreMode,
    pub phase: ReconcilePhase,
    pub table: String,
    pub rows_done: u64,
    /// Row total if the remote reported one.
    pub total_known: Option<u64>,
    pub error: Option<String>,
}

/// Per-table line of a finished reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub rows_applied: u64,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub mode: RestoreMode,
    pub tables: Vec<TableReport>,
}

impl ReconcileReport {
    pub fn rows_applied(&self) -> u64 {
        self.tables.iter().map(|t| t.rows_applied).sum()
    }
}
