//! # stride-storage
//!
//! SQLite persistence layer: one serialized write connection, migrations via
//! `PRAGMA user_version`, and the queries behind the mutation queue, the
//! engine-state singleton, the dataset marker, and the local row store.

pub mod connection;
pub mod engine;
pub mod migrations;
pub mod queries;
pub mod recovery;
pub mod retention;

use chrono::{DateTime, Utc};
use stride_core::errors::StorageError;

pub use connection::DatabaseManager;
pub use engine::StorageEngine;
pub use retention::{RetentionPolicy, RetentionReport};

/// Convert any displayable SQLite failure into a [`StorageError`].
pub(crate) fn to_storage_err(message: impl Into<String>) -> StorageError {
    StorageError::SqliteError {
        message: message.into(),
    }
}

/// Timestamps are stored as epoch milliseconds.
pub(crate) fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| StorageError::CorruptionDetected {
        details: format!("timestamp out of range: {ms}"),
    })
}

pub(crate) fn from_millis_opt(ms: Option<i64>) -> Result<Option<DateTime<Utc>>, StorageError> {
    ms.map(from_millis).transpose()
}

/// Drop sub-millisecond precision so values survive a storage round-trip unchanged.
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}
