//! Startup recovery for a queue left behind by a killed process.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use stride_core::errors::StorageError;

use crate::connection::pragmas::quick_check;
use crate::queries::queue_ops;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    /// Entries found `processing` and returned to `pending`.
    pub requeued: u64,
}

/// Verify integrity, then requeue entries that were in flight when the
/// previous process died. Those mutations will be applied again, which is
/// why appliers receive a stable idempotency key.
pub fn recover(conn: &Connection, now: DateTime<Utc>) -> Result<RecoveryReport, StorageError> {
    quick_check(conn)?;
    let requeued = queue_ops::reset_processing(conn, now)?;
    if requeued > 0 {
        tracing::warn!(requeued, "requeued entries interrupted mid-dispatch");
    }
    Ok(RecoveryReport { requeued })
}
