//! Queue gate decisions and forced drain through a running dispatcher.

use std::sync::Arc;
use std::time::Duration;

use stride_core::config::{BreakerConfig, DispatchConfig};
use stride_core::errors::{ApplyError, GateError};
use stride_core::models::EntryStatus;
use stride_core::traits::{Clock, RemoteApplier};
use stride_storage::StorageEngine;
use stride_sync::{Dispatcher, DispatcherHandle, MutationQueue, QueueGate};
use test_fixtures::{FixtureMutation, ManualClock, ScriptedApplier};

struct Rig {
    store: Arc<StorageEngine>,
    clock: ManualClock,
    applier: Arc<ScriptedApplier<FixtureMutation>>,
    queue: MutationQueue<FixtureMutation>,
    gate: QueueGate,
    handle: DispatcherHandle,
}

/// Spawns a paused dispatcher so nothing drains unless the gate asks for it.
async fn rig(applier: ScriptedApplier<FixtureMutation>) -> Rig {
    let store = Arc::new(StorageEngine::open_in_memory().unwrap());
    let clock = ManualClock::at_epoch();
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let applier = Arc::new(applier);
    let dispatcher = Dispatcher::new(
        Arc::clone(&store),
        Arc::clone(&applier) as Arc<dyn RemoteApplier<FixtureMutation>>,
        Arc::clone(&shared),
        DispatchConfig::default(),
        BreakerConfig::default(),
    )
    .unwrap();
    let (handle, _task) = dispatcher.spawn();
    handle.pause().await.unwrap();
    Rig {
        queue: MutationQueue::new(Arc::clone(&store), shared, 5),
        gate: QueueGate::new(Arc::clone(&store)),
        store,
        clock,
        applier,
        handle,
    }
}

const DRAIN: Duration = Duration::from_secs(5);

// ─── can_switch_user ────────────────────────────────────────────

#[tokio::test]
async fn empty_queue_allows_any_user() {
    let rig = rig(ScriptedApplier::always_ok()).await;
    let check = rig.gate.can_switch_user("bob").unwrap();
    assert!(check.allowed);
    assert_eq!(check.pending_count, 0);
    assert_eq!(check.blocking_user_id, None);
}

#[tokio::test]
async fn own_entries_never_block() {
    let rig = rig(ScriptedApplier::always_ok()).await;
    rig.queue.enqueue("alice", &FixtureMutation::delete("n1")).unwrap();
    assert!(rig.gate.can_switch_user("alice").unwrap().allowed);
}

#[tokio::test]
async fn foreign_unsynced_entries_block() {
    let rig = rig(ScriptedApplier::always_ok()).await;
    let a = rig.queue.enqueue("alice", &FixtureMutation::delete("n1")).unwrap();
    rig.queue.enqueue("alice", &FixtureMutation::delete("n2")).unwrap();
    let done = rig.queue.enqueue("alice", &FixtureMutation::delete("n3")).unwrap();
    rig.store.mark_failed(&a.id, 5, "exhausted", rig.clock.now()).unwrap();
    rig.store.mark_completed(&done.id, rig.clock.now()).unwrap();

    let check = rig.gate.can_switch_user("bob").unwrap();
    assert!(!check.allowed);
    // Failed counts, completed does not.
    assert_eq!(check.pending_count, 2);
    assert_eq!(check.blocking_user_id.as_deref(), Some("alice"));
}

// ─── admit ──────────────────────────────────────────────────────

#[tokio::test]
async fn admit_without_drain_is_blocked_and_keeps_data() {
    let rig = rig(ScriptedApplier::always_ok()).await;
    let entry = rig.queue.enqueue("alice", &FixtureMutation::delete("n1")).unwrap();

    let err = rig.gate.admit("bob", false, &rig.handle, DRAIN).await.unwrap_err();

    assert!(matches!(
        err,
        GateError::Blocked { ref blocking_user_id, pending_count: 1 } if blocking_user_id == "alice"
    ));
    assert_eq!(rig.applier.call_count(), 0);
    assert_eq!(rig.store.get_entry(&entry.id).unwrap().unwrap().status, EntryStatus::Pending);
}

#[tokio::test]
async fn forced_drain_that_syncs_everything_admits() {
    let rig = rig(ScriptedApplier::always_ok()).await;
    let first = rig.queue.enqueue("alice", &FixtureMutation::delete("n1")).unwrap();
    let second = rig.queue.enqueue("alice", &FixtureMutation::delete("n2")).unwrap();

    let check = rig.gate.admit("bob", true, &rig.handle, DRAIN).await.unwrap();

    assert!(check.allowed);
    for id in [&first.id, &second.id] {
        assert_eq!(rig.store.get_entry(id).unwrap().unwrap().status, EntryStatus::Completed);
    }
}

#[tokio::test]
async fn failed_entry_keeps_blocking_through_a_forced_drain() {
    let rig = rig(ScriptedApplier::always_ok()).await;
    rig.queue.enqueue("alice", &FixtureMutation::delete("n1")).unwrap();
    let failed = rig.queue.enqueue("alice", &FixtureMutation::delete("n2")).unwrap();
    rig.store.mark_failed(&failed.id, 1, "422 invalid", rig.clock.now()).unwrap();

    let err = rig.gate.admit("bob", true, &rig.handle, DRAIN).await.unwrap_err();

    assert!(matches!(
        err,
        GateError::Blocked { ref blocking_user_id, pending_count: 1 } if blocking_user_id == "alice"
    ));
    // Only the pending entry reached the applier.
    assert_eq!(rig.applier.call_count(), 1);
    let stored = rig.store.get_entry(&failed.id).unwrap().unwrap();
    assert_eq!(stored.status, EntryStatus::Failed);
    assert_eq!(stored.retry_count, 1);

    rig.queue.discard_failed(&failed.id).unwrap();
    assert!(rig.gate.admit("bob", true, &rig.handle, DRAIN).await.unwrap().allowed);
}

#[tokio::test]
async fn forced_drain_covers_every_blocking_user() {
    let rig = rig(ScriptedApplier::always_ok()).await;
    rig.queue.enqueue("alice", &FixtureMutation::delete("a")).unwrap();
    rig.queue.enqueue("carol", &FixtureMutation::delete("c")).unwrap();

    let check = rig.gate.admit("bob", true, &rig.handle, DRAIN).await.unwrap();

    assert!(check.allowed);
    assert_eq!(rig.applier.call_count(), 2);
}

#[tokio::test]
async fn forced_drain_that_fails_stays_blocked() {
    let rig = rig(ScriptedApplier::always_fail(ApplyError::rejected("conflict"))).await;
    let entry = rig.queue.enqueue("alice", &FixtureMutation::delete("n1")).unwrap();

    let err = rig.gate.admit("bob", true, &rig.handle, DRAIN).await.unwrap_err();

    assert!(matches!(err, GateError::Blocked { pending_count: 1, .. }));
    assert_eq!(rig.applier.call_count(), 1);
    // Nothing is discarded to make room for the switch.
    let stored = rig.store.get_entry(&entry.id).unwrap().unwrap();
    assert_eq!(stored.status, EntryStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn forced_drain_is_bounded_by_its_deadline() {
    let rig = rig(ScriptedApplier::always_hang()).await;
    rig.queue.enqueue("alice", &FixtureMutation::delete("n1")).unwrap();

    let err = rig
        .gate
        .admit("bob", true, &rig.handle, Duration::from_millis(200))
        .await
        .unwrap_err();

    assert!(matches!(err, GateError::Blocked { .. }));
    assert_eq!(rig.store.queue_stats().unwrap().unsynced(), 1);
}

#[tokio::test]
async fn stopped_dispatcher_cannot_drain() {
    let rig = rig(ScriptedApplier::always_ok()).await;
    rig.queue.enqueue("alice", &FixtureMutation::delete("n1")).unwrap();
    rig.handle.shutdown().await;
    while rig.handle.is_running() {
        tokio::task::yield_now().await;
    }

    let err = rig.gate.admit("bob", true, &rig.handle, DRAIN).await.unwrap_err();
    assert!(matches!(err, GateError::DispatcherUnavailable));
}
