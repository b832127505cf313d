//! StorageEngine: the high-level persistence API used by the sync crate.
//!
//! Wraps the `DatabaseManager` and exposes one method per query so callers
//! never touch a raw `Connection`. Also the built-in `LocalTableStore`.

use std::path::Path;

use chrono::{DateTime, Utc};

use stride_core::config::StorageConfig;
use stride_core::constants::MAX_UPSERT_BATCH;
use stride_core::errors::StorageError;
use stride_core::models::{
    EngineState, EntryStatus, LocalDatasetMarker, QueueEntry, QueueStats, RemoteRow,
};
use stride_core::traits::LocalTableStore;

use crate::connection::DatabaseManager;
use crate::queries::row_ops::LocalRow;
use crate::queries::{dataset_ops, engine_state_ops, queue_ops, row_ops};
use crate::recovery::{self, RecoveryReport};
use crate::retention::{self, RetentionPolicy, RetentionReport};

pub struct StorageEngine {
    db: DatabaseManager,
}

impl StorageEngine {
    /// Open the database named by `config.db_path`.
    pub fn open(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::open_at(Path::new(&config.db_path), config)
    }

    pub fn open_at(path: &Path, config: &StorageConfig) -> Result<Self, StorageError> {
        let db = DatabaseManager::open(path, config)?;
        tracing::debug!(path = %path.display(), "opened stride database");
        Ok(Self { db })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            db: DatabaseManager::open_in_memory()?,
        })
    }

    pub fn db(&self) -> &DatabaseManager {
        &self.db
    }

    /// Run startup recovery. Call once before the dispatcher starts.
    pub fn recover(&self, now: DateTime<Utc>) -> Result<RecoveryReport, StorageError> {
        self.db.with_transaction(|tx| recovery::recover(tx, now))
    }

    // ─── Queue ──────────────────────────────────────────────────────

    /// Durably append an entry. Committed before this returns.
    pub fn insert_entry(&self, entry: &QueueEntry) -> Result<i64, StorageError> {
        self.db
            .with_transaction(|tx| queue_ops::insert_entry(tx, entry))
    }

    pub fn get_entry(&self, id: &str) -> Result<Option<QueueEntry>, StorageError> {
        self.db.with_conn(|conn| queue_ops::get_entry(conn, id))
    }

    pub fn next_eligible(&self, now: DateTime<Utc>) -> Result<Option<QueueEntry>, StorageError> {
        self.db.with_conn(|conn| queue_ops::next_eligible(conn, now))
    }

    pub fn next_scheduled_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.db.with_conn(|conn| queue_ops::next_scheduled_at(conn, now))
    }

    pub fn mark_processing(&self, id: &str, now: DateTime<Utc>) -> Result<bool, StorageError> {
        self.db
            .with_transaction(|tx| queue_ops::mark_processing(tx, id, now))
    }

    pub fn mark_completed(&self, id: &str, now: DateTime<Utc>) -> Result<(), StorageError> {
        self.db
            .with_transaction(|tx| queue_ops::mark_completed(tx, id, now))
    }

    pub fn mark_failed(
        &self,
        id: &str,
        retry_count: u32,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.db
            .with_transaction(|tx| queue_ops::mark_failed(tx, id, retry_count, error, now))
    }

    pub fn reschedule(
        &self,
        id: &str,
        retry_count: u32,
        scheduled_at: DateTime<Utc>,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.db.with_transaction(|tx| {
            queue_ops::reschedule(tx, id, retry_count, scheduled_at, error, now)
        })
    }

    pub fn queue_stats(&self) -> Result<QueueStats, StorageError> {
        self.db.with_conn(queue_ops::stats)
    }

    pub fn entries_with_status(&self, status: EntryStatus) -> Result<Vec<QueueEntry>, StorageError> {
        self.db
            .with_conn(|conn| queue_ops::list_by_status(conn, status))
    }

    pub fn unsynced_for_user(&self, user_id: &str) -> Result<Vec<QueueEntry>, StorageError> {
        self.db
            .with_conn(|conn| queue_ops::unsynced_for_user(conn, user_id))
    }

    /// Count and oldest owner of unsynced entries not owned by `incoming_user`.
    pub fn blocking_entries(
        &self,
        incoming_user: &str,
    ) -> Result<(u64, Option<String>), StorageError> {
        self.db
            .with_conn(|conn| queue_ops::blocking_entries(conn, incoming_user))
    }

    pub fn pull_forward_pending(&self, now: DateTime<Utc>) -> Result<u64, StorageError> {
        self.db
            .with_transaction(|tx| queue_ops::pull_forward_pending(tx, now))
    }

    pub fn requeue_failed(
        &self,
        id: &str,
        budget: u32,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        self.db
            .with_transaction(|tx| queue_ops::requeue_failed(tx, id, budget, now))
    }

    pub fn delete_failed(&self, id: &str) -> Result<bool, StorageError> {
        self.db
            .with_transaction(|tx| queue_ops::delete_failed(tx, id))
    }

    pub fn apply_retention(
        &self,
        policy: &RetentionPolicy,
        now: DateTime<Utc>,
    ) -> Result<RetentionReport, StorageError> {
        self.db
            .with_conn(|conn| retention::apply_retention(conn, policy, now))
    }

    // ─── Engine state ───────────────────────────────────────────────

    pub fn load_engine_state(&self) -> Result<EngineState, StorageError> {
        self.db.with_conn(engine_state_ops::load)
    }

    pub fn save_engine_state(
        &self,
        state: &EngineState,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.db
            .with_transaction(|tx| engine_state_ops::save(tx, state, now))
    }

    // ─── Local rows ─────────────────────────────────────────────────

    /// Write a row edited locally (unsynced).
    pub fn write_local_row(
        &self,
        table: &str,
        id: &str,
        data: &serde_json::Value,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.db
            .with_transaction(|tx| row_ops::write_local(tx, table, id, data, updated_at))
    }

    pub fn get_row(&self, table: &str, id: &str) -> Result<Option<LocalRow>, StorageError> {
        self.db.with_conn(|conn| row_ops::get_row(conn, table, id))
    }
}

impl LocalTableStore for StorageEngine {
    fn clear_table(&self, table: &str) -> Result<u64, StorageError> {
        self.db.with_transaction(|tx| row_ops::clear_table(tx, table))
    }

    fn upsert_rows(&self, table: &str, rows: &[RemoteRow]) -> Result<u64, StorageError> {
        let mut applied = 0;
        for chunk in rows.chunks(MAX_UPSERT_BATCH) {
            applied += self
                .db
                .with_transaction(|tx| row_ops::upsert_synced(tx, table, chunk))?;
        }
        Ok(applied)
    }

    fn max_recency(&self, table: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.db.with_conn(|conn| row_ops::max_recency(conn, table))
    }

    fn row_count(&self, table: &str) -> Result<u64, StorageError> {
        self.db.with_conn(|conn| row_ops::row_count(conn, table))
    }

    fn dataset_marker(&self) -> Result<LocalDatasetMarker, StorageError> {
        self.db.with_conn(dataset_ops::load_marker)
    }

    fn set_dataset_marker(
        &self,
        marker: &LocalDatasetMarker,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.db
            .with_transaction(|tx| dataset_ops::save_marker(tx, marker, now))
    }
}
