//! Retention sweep for the mutation queue.
//!
//! Two tiers, both measured from the entry's last status change:
//! - **Completed** (default 7 days): already delivered, kept for diagnostics.
//! - **Failed** (default 30 days): surfaced for manual handling first.
//!
//! `pending` and `processing` entries are never swept.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use stride_core::config::QueueConfig;
use stride_core::errors::StorageError;
use stride_core::models::EntryStatus;

use crate::{to_millis, to_storage_err};

/// Configurable retention windows.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    pub completed_days: u32,
    pub failed_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from(&QueueConfig::default())
    }
}

impl From<&QueueConfig> for RetentionPolicy {
    fn from(config: &QueueConfig) -> Self {
        Self {
            completed_days: config.completed_retention_days,
            failed_days: config.failed_retention_days,
        }
    }
}

/// Report of what was cleaned.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetentionReport {
    pub total_deleted: u64,
    pub per_status: Vec<StatusCleanup>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCleanup {
    pub status: EntryStatus,
    pub deleted: u64,
}

/// Apply the retention policy relative to `now`. Runs in one transaction.
pub fn apply_retention(
    conn: &Connection,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Result<RetentionReport, StorageError> {
    let start = std::time::Instant::now();
    let mut report = RetentionReport::default();

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("retention begin: {e}")))?;

    let tiers = [
        (EntryStatus::Completed, policy.completed_days),
        (EntryStatus::Failed, policy.failed_days),
    ];
    for (status, days) in tiers {
        let cutoff = now - Duration::days(i64::from(days));
        let deleted = cleanup_by_status(&tx, status, cutoff)?;
        report.per_status.push(StatusCleanup { status, deleted });
    }

    tx.commit().map_err(|e| to_storage_err(e.to_string()))?;

    report.duration_ms = start.elapsed().as_millis() as u64;
    report.total_deleted = report.per_status.iter().map(|s| s.deleted).sum();
    tracing::info!(
        deleted = report.total_deleted,
        duration_ms = report.duration_ms,
        "queue retention sweep complete"
    );
    Ok(report)
}

fn cleanup_by_status(
    conn: &Connection,
    status: EntryStatus,
    cutoff: DateTime<Utc>,
) -> Result<u64, StorageError> {
    let deleted = conn
        .execute(
            "DELETE FROM sync_queue WHERE status = ?1 AND updated_at < ?2",
            params![status.as_str(), to_millis(cutoff)],
        )
        .map_err(|e| to_storage_err(format!("retention cleanup {status}: {e}")))?;
    Ok(deleted as u64)
}
