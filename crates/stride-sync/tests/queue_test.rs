//! MutationQueue: append, durability, manual handling of failed entries.

use std::sync::Arc;

use stride_core::config::StorageConfig;
use stride_core::errors::{QueueError, StorageError};
use stride_core::models::EntryStatus;
use stride_core::traits::Clock;
use stride_storage::StorageEngine;
use stride_sync::MutationQueue;
use test_fixtures::{FixtureMutation, ManualClock};

fn queue(store: &Arc<StorageEngine>, clock: &ManualClock) -> MutationQueue<FixtureMutation> {
    MutationQueue::new(Arc::clone(store), Arc::new(clock.clone()) as Arc<dyn Clock>, 5)
}

#[test]
fn enqueue_persists_a_due_pending_entry() {
    let store = Arc::new(StorageEngine::open_in_memory().unwrap());
    let clock = ManualClock::at_epoch();
    let queue = queue(&store, &clock);

    let entry = queue.enqueue("alice", &FixtureMutation::upsert("n1", "hi")).unwrap();

    assert_eq!(entry.status, EntryStatus::Pending);
    assert_eq!(entry.retry_count, 0);
    assert_eq!(entry.max_retries, 5);
    assert_eq!(entry.user_id, "alice");
    assert_eq!(entry.mutation_code, "note.upsert");
    assert_eq!(entry.payload, serde_json::json!({"id": "n1", "body": "hi"}));
    assert_eq!(entry.scheduled_at, clock.now());
    assert_eq!(queue.get(&entry.id).unwrap(), Some(entry));
}

#[test]
fn unit_variant_is_stored_with_null_payload() {
    let store = Arc::new(StorageEngine::open_in_memory().unwrap());
    let clock = ManualClock::at_epoch();
    let entry = queue(&store, &clock)
        .enqueue("alice", &FixtureMutation::TouchProfile)
        .unwrap();
    assert_eq!(entry.mutation_code, "profile.touch");
    assert!(entry.payload.is_null());
}

#[test]
fn entry_ids_are_unique_and_seq_increases() {
    let store = Arc::new(StorageEngine::open_in_memory().unwrap());
    let clock = ManualClock::at_epoch();
    let queue = queue(&store, &clock);

    let a = queue.enqueue("alice", &FixtureMutation::delete("a")).unwrap();
    let b = queue.enqueue("alice", &FixtureMutation::delete("b")).unwrap();
    assert_ne!(a.id, b.id);
    assert!(b.seq > a.seq);
}

#[test]
fn enqueued_entry_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stride.db");
    let clock = ManualClock::at_epoch();
    let config = StorageConfig::default();

    let id = {
        let store = Arc::new(StorageEngine::open_at(&path, &config).unwrap());
        queue(&store, &clock)
            .enqueue("alice", &FixtureMutation::upsert("n1", "kept"))
            .unwrap()
            .id
    };

    let store = Arc::new(StorageEngine::open_at(&path, &config).unwrap());
    let entry = queue(&store, &clock).get(&id).unwrap().unwrap();
    assert_eq!(entry.status, EntryStatus::Pending);
    assert_eq!(entry.payload["body"], "kept");
}

// ─── Failed entries ─────────────────────────────────────────────

#[test]
fn retry_failed_rearms_entry_due_now() {
    let store = Arc::new(StorageEngine::open_in_memory().unwrap());
    let clock = ManualClock::at_epoch();
    let queue = queue(&store, &clock);
    let entry = queue.enqueue("alice", &FixtureMutation::delete("x")).unwrap();
    store.mark_failed(&entry.id, 5, "gave up", clock.now()).unwrap();

    assert_eq!(queue.failed_entries().unwrap().len(), 1);
    clock.advance_secs(60);
    let rearmed = queue.retry_failed(&entry.id).unwrap();

    assert_eq!(rearmed.status, EntryStatus::Pending);
    assert_eq!(rearmed.retry_count, 5);
    assert_eq!(rearmed.max_retries, 10);
    assert_eq!(rearmed.scheduled_at, clock.now());
    assert!(queue.failed_entries().unwrap().is_empty());
}

#[test]
fn retry_of_pending_entry_is_invalid_state() {
    let store = Arc::new(StorageEngine::open_in_memory().unwrap());
    let clock = ManualClock::at_epoch();
    let queue = queue(&store, &clock);
    let entry = queue.enqueue("alice", &FixtureMutation::delete("x")).unwrap();

    let err = queue.retry_failed(&entry.id).unwrap_err();
    assert!(matches!(
        err,
        QueueError::InvalidState {
            status: EntryStatus::Pending,
            expected: EntryStatus::Failed,
            ..
        }
    ));
}

#[test]
fn unknown_entry_is_not_found() {
    let store = Arc::new(StorageEngine::open_in_memory().unwrap());
    let clock = ManualClock::at_epoch();
    let err = queue(&store, &clock).discard_failed("missing").unwrap_err();
    assert!(matches!(err, QueueError::Storage(StorageError::NotFound { .. })));
}

#[test]
fn discard_failed_removes_entry() {
    let store = Arc::new(StorageEngine::open_in_memory().unwrap());
    let clock = ManualClock::at_epoch();
    let queue = queue(&store, &clock);
    let entry = queue.enqueue("alice", &FixtureMutation::delete("x")).unwrap();
    store.mark_failed(&entry.id, 1, "rejected", clock.now()).unwrap();

    queue.discard_failed(&entry.id).unwrap();
    assert!(queue.get(&entry.id).unwrap().is_none());
    assert_eq!(queue.stats().unwrap().total(), 0);
}
