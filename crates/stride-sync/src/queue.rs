//! MutationQueue: typed facade over the durable queue table.

use std::marker::PhantomData;
use std::sync::Arc;

use stride_core::errors::{QueueError, StorageError};
use stride_core::models::{EntryStatus, QueueEntry, QueueStats};
use stride_core::traits::{encode_mutation, Clock, Mutation};
use stride_storage::StorageEngine;

/// Appends mutations and exposes the manual-handling operations for failed
/// entries. Never touches the network.
pub struct MutationQueue<M> {
    store: Arc<StorageEngine>,
    clock: Arc<dyn Clock>,
    max_retries: u32,
    _mutation: PhantomData<fn() -> M>,
}

impl<M: Mutation> MutationQueue<M> {
    pub fn new(store: Arc<StorageEngine>, clock: Arc<dyn Clock>, max_retries: u32) -> Self {
        Self {
            store,
            clock,
            max_retries,
            _mutation: PhantomData,
        }
    }

    /// Append a mutation for `user_id`. The entry is committed to disk before
    /// this returns.
    pub fn enqueue(&self, user_id: &str, mutation: &M) -> Result<QueueEntry, QueueError> {
        let encoded = encode_mutation(mutation)?;
        let now = self.clock.now();
        let mut entry = QueueEntry {
            id: uuid::Uuid::new_v4().to_string(),
            seq: 0,
            user_id: user_id.to_string(),
            mutation_code: encoded.code,
            payload: encoded.payload,
            status: EntryStatus::Pending,
            retry_count: 0,
            max_retries: self.max_retries,
            error_message: None,
            scheduled_at: now,
            created_at: now,
            updated_at: now,
        };
        entry.seq = self.store.insert_entry(&entry)?;
        tracing::debug!(
            entry_id = %entry.id,
            mutation_code = %entry.mutation_code,
            user_id,
            "mutation enqueued"
        );
        Ok(entry)
    }

    pub fn get(&self, id: &str) -> Result<Option<QueueEntry>, QueueError> {
        Ok(self.store.get_entry(id)?)
    }

    pub fn stats(&self) -> Result<QueueStats, QueueError> {
        Ok(self.store.queue_stats()?)
    }

    /// Terminally failed entries awaiting a decision from the business layer.
    pub fn failed_entries(&self) -> Result<Vec<QueueEntry>, QueueError> {
        Ok(self.store.entries_with_status(EntryStatus::Failed)?)
    }

    /// Re-arm a failed entry, due immediately. The entry keeps its retry
    /// count and gets another `max_retries` attempts on top of it.
    pub fn retry_failed(&self, id: &str) -> Result<QueueEntry, QueueError> {
        self.require_failed(id)?;
        self.store
            .requeue_failed(id, self.max_retries, self.clock.now())?;
        tracing::info!(entry_id = id, "failed entry re-armed");
        self.store.get_entry(id)?.ok_or_else(|| not_found(id).into())
    }

    /// Permanently drop a failed entry.
    pub fn discard_failed(&self, id: &str) -> Result<(), QueueError> {
        self.require_failed(id)?;
        self.store.delete_failed(id)?;
        tracing::info!(entry_id = id, "failed entry discarded");
        Ok(())
    }

    fn require_failed(&self, id: &str) -> Result<QueueEntry, QueueError> {
        let entry = self.store.get_entry(id)?.ok_or_else(|| not_found(id))?;
        if entry.status != EntryStatus::Failed {
            return Err(QueueError::InvalidState {
                id: id.to_string(),
                status: entry.status,
                expected: EntryStatus::Failed,
            });
        }
        Ok(entry)
    }
}

fn not_found(id: &str) -> StorageError {
    StorageError::NotFound {
        entity: "queue entry",
        id: id.to_string(),
    }
}
