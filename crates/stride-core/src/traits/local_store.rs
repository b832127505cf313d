use chrono::{DateTime, Utc};

use crate::errors::StorageError;
use crate::models::{LocalDatasetMarker, RemoteRow};

/// Local tables as seen by reconciliation. The service treats tables as
/// opaque names from configuration; it never knows what a row means.
pub trait LocalTableStore: Send + Sync {
    /// Delete every local row of `table`. Returns the number removed.
    fn clear_table(&self, table: &str) -> Result<u64, StorageError>;

    /// Insert or update rows by id, marking them synced. Rows older than the
    /// local copy are skipped (row-level last-write-wins).
    fn upsert_rows(&self, table: &str, rows: &[RemoteRow]) -> Result<u64, StorageError>;

    /// Most recent recency value among synced rows of `table`. Local edits
    /// do not move the watermark.
    fn max_recency(&self, table: &str) -> Result<Option<DateTime<Utc>>, StorageError>;

    fn row_count(&self, table: &str) -> Result<u64, StorageError>;

    fn dataset_marker(&self) -> Result<LocalDatasetMarker, StorageError>;

    /// Persist `marker`, stamped with the caller's `now`.
    fn set_dataset_marker(
        &self,
        marker: &LocalDatasetMarker,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}
