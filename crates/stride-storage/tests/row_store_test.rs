//! Local row store and dataset marker.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use stride_core::models::{LocalDatasetMarker, RemoteRow, RestoreMode, RestoreState};
use stride_core::traits::LocalTableStore;
use stride_storage::StorageEngine;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap()
}

fn row(id: &str, at: DateTime<Utc>, name: &str) -> RemoteRow {
    RemoteRow {
        id: id.to_string(),
        updated_at: at,
        data: json!({"name": name}),
    }
}

#[test]
fn upsert_marks_rows_synced() {
    let store = StorageEngine::open_in_memory().unwrap();
    store.write_local_row("routines", "r1", &json!({"name": "draft"}), t0()).unwrap();
    assert!(!store.get_row("routines", "r1").unwrap().unwrap().is_synced);

    store
        .upsert_rows("routines", &[row("r1", t0() + Duration::seconds(1), "final")])
        .unwrap();
    let local = store.get_row("routines", "r1").unwrap().unwrap();
    assert!(local.is_synced);
    assert_eq!(local.data, json!({"name": "final"}));
}

#[test]
fn older_remote_row_does_not_overwrite_newer_local_row() {
    let store = StorageEngine::open_in_memory().unwrap();
    store.write_local_row("routines", "r1", &json!({"name": "mine"}), t0()).unwrap();

    let applied = store
        .upsert_rows("routines", &[row("r1", t0() - Duration::hours(1), "stale")])
        .unwrap();
    assert_eq!(applied, 0);
    assert_eq!(
        store.get_row("routines", "r1").unwrap().unwrap().data,
        json!({"name": "mine"})
    );
}

#[test]
fn repeated_upserts_converge_to_one_row_per_id() {
    let store = StorageEngine::open_in_memory().unwrap();
    let rows = vec![row("a", t0(), "A"), row("b", t0(), "B")];
    store.upsert_rows("exercises", &rows).unwrap();
    store.upsert_rows("exercises", &rows).unwrap();

    assert_eq!(store.row_count("exercises").unwrap(), 2);
    assert_eq!(store.max_recency("exercises").unwrap(), Some(t0()));
}

#[test]
fn local_edits_do_not_move_the_watermark() {
    let store = StorageEngine::open_in_memory().unwrap();
    store.upsert_rows("exercises", &[row("a", t0(), "A")]).unwrap();
    store
        .write_local_row("exercises", "b", &json!({"name": "B"}), t0() + Duration::days(3))
        .unwrap();

    assert_eq!(store.max_recency("exercises").unwrap(), Some(t0()));
}

#[test]
fn clear_table_is_scoped_to_one_table() {
    let store = StorageEngine::open_in_memory().unwrap();
    store.upsert_rows("a", &[row("1", t0(), "x")]).unwrap();
    store.upsert_rows("b", &[row("1", t0(), "y")]).unwrap();

    assert_eq!(store.clear_table("a").unwrap(), 1);
    assert_eq!(store.row_count("a").unwrap(), 0);
    assert_eq!(store.row_count("b").unwrap(), 1);
    assert_eq!(store.max_recency("a").unwrap(), None);
}

#[test]
fn fresh_database_has_empty_marker() {
    let store = StorageEngine::open_in_memory().unwrap();
    assert_eq!(store.dataset_marker().unwrap(), LocalDatasetMarker::default());
}

#[test]
fn dataset_marker_round_trips() {
    let store = StorageEngine::open_in_memory().unwrap();
    let marker = LocalDatasetMarker {
        owner_user_id: Some("alice".to_string()),
        schema_version: Some(3),
        restore_state: RestoreState::Ready,
        last_restore_mode: Some(RestoreMode::FullReset),
        last_restored_at: Some(t0()),
    };
    store.set_dataset_marker(&marker, t0()).unwrap();
    assert_eq!(store.dataset_marker().unwrap(), marker);
}

#[test]
fn dataset_marker_is_stamped_with_the_callers_time() {
    let store = StorageEngine::open_in_memory().unwrap();
    let stamped = t0() - Duration::days(400);
    store
        .set_dataset_marker(&LocalDatasetMarker::default(), stamped)
        .unwrap();

    let updated_at = store
        .db()
        .with_conn(|conn| {
            Ok(conn.query_row("SELECT updated_at FROM local_dataset", [], |r| {
                r.get::<_, i64>(0)
            }))
        })
        .unwrap()
        .unwrap();
    assert_eq!(updated_at, stamped.timestamp_millis());
}
