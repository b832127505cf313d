//! Tests for the Stride configuration system.

use std::sync::Mutex;

use stride_core::config::{validate_table_order, StrideConfig};
use stride_core::errors::ConfigError;
use stride_core::models::{TableCategory, TableSyncConfig};

/// Serializes tests that touch `STRIDE_*` environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn clear_stride_env_vars() {
    for key in [
        "STRIDE_DB_PATH",
        "STRIDE_MAX_RETRIES",
        "STRIDE_BACKOFF_BASE_MS",
        "STRIDE_BACKOFF_MAX_MS",
        "STRIDE_APPLY_TIMEOUT_MS",
        "STRIDE_DEGRADED_AFTER",
        "STRIDE_FAILED_AFTER",
        "STRIDE_PAGE_SIZE",
        "STRIDE_PAGE_TIMEOUT_MS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_are_valid() {
    let config = StrideConfig::default();
    config.validate().unwrap();
    assert_eq!(config.queue.max_retries, 5);
    assert_eq!(config.breaker.degraded_after, 3);
    assert_eq!(config.breaker.failed_after, 8);
    assert_eq!(config.dispatch.backoff_base_ms, 1_000);
    assert_eq!(config.dispatch.backoff_max_ms, 300_000);
    assert!(config.reconcile.tables.is_empty());
}

#[test]
fn partial_toml_keeps_defaults_for_the_rest() {
    let config = StrideConfig::from_toml(
        r#"
[queue]
max_retries = 7

[[reconcile.tables]]
table = "exercises"
recency_column = "updated_at"

[[reconcile.tables]]
table = "sessions"
recency_column = "performed_at"
lookback_days = 90
category = "transactional"
depends_on = ["exercises"]
"#,
    )
    .unwrap();

    assert_eq!(config.queue.max_retries, 7);
    assert_eq!(config.queue.completed_retention_days, 7);
    assert_eq!(config.dispatch, StrideConfig::default().dispatch);

    let sessions = &config.reconcile.tables[1];
    assert_eq!(sessions.recency_column, "performed_at");
    assert_eq!(sessions.category, TableCategory::Transactional);
    assert_eq!(sessions.lookback_days, Some(90));
    assert_eq!(sessions.depends_on, vec!["exercises".to_string()]);
    assert_eq!(config.reconcile.tables[0].category, TableCategory::Reference);
    config.validate().unwrap();
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let err = StrideConfig::from_toml("this is not valid toml {{{{").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn load_reads_file_and_applies_env_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_stride_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stride.toml");
    std::fs::write(
        &path,
        r#"
[dispatch]
backoff_base_ms = 250
apply_timeout_ms = 10000
"#,
    )
    .unwrap();
    std::env::set_var("STRIDE_APPLY_TIMEOUT_MS", "4000");
    std::env::set_var("STRIDE_PAGE_SIZE", "50");

    let config = StrideConfig::load(Some(&path)).unwrap();

    assert_eq!(config.dispatch.backoff_base_ms, 250);
    // Env beats file.
    assert_eq!(config.dispatch.apply_timeout_ms, 4_000);
    assert_eq!(config.reconcile.page_size, 50);

    clear_stride_env_vars();
}

#[test]
fn unparseable_env_override_is_ignored() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_stride_env_vars();

    std::env::set_var("STRIDE_MAX_RETRIES", "lots");
    let config = StrideConfig::load(None).unwrap();
    assert_eq!(config.queue.max_retries, 5);

    clear_stride_env_vars();
}

#[test]
fn missing_file_is_reported() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_stride_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let err = StrideConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

// ─── Validation ─────────────────────────────────────────────────

fn field_of(config: &StrideConfig) -> String {
    match config.validate() {
        Err(ConfigError::ValidationFailed { field, .. }) => field,
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
}

#[test]
fn zero_retries_is_rejected() {
    let mut config = StrideConfig::default();
    config.queue.max_retries = 0;
    assert_eq!(field_of(&config), "queue.max_retries");
}

#[test]
fn backoff_cap_below_base_is_rejected() {
    let mut config = StrideConfig::default();
    config.dispatch.backoff_max_ms = config.dispatch.backoff_base_ms - 1;
    assert_eq!(field_of(&config), "dispatch.backoff_max_ms");
}

#[test]
fn breaker_thresholds_must_be_ordered() {
    let mut config = StrideConfig::default();
    config.breaker.failed_after = config.breaker.degraded_after;
    assert_eq!(field_of(&config), "breaker.failed_after");
}

#[test]
fn empty_db_path_is_rejected() {
    let mut config = StrideConfig::default();
    config.storage.db_path = "  ".to_string();
    assert_eq!(field_of(&config), "storage.db_path");
}

// ─── Table order ────────────────────────────────────────────────

#[test]
fn parents_listed_first_are_accepted() {
    let tables = vec![
        TableSyncConfig::new("exercises", "updated_at"),
        TableSyncConfig::new("routines", "updated_at").depends_on("exercises"),
        TableSyncConfig::new("sessions", "updated_at")
            .transactional(30)
            .depends_on("routines")
            .depends_on("exercises"),
    ];
    validate_table_order(&tables).unwrap();
}

#[test]
fn child_before_parent_is_rejected() {
    let tables = vec![
        TableSyncConfig::new("routines", "updated_at").depends_on("exercises"),
        TableSyncConfig::new("exercises", "updated_at"),
    ];
    let err = validate_table_order(&tables).unwrap_err();
    assert!(err.to_string().contains("routines"));
}

#[test]
fn duplicate_table_is_rejected() {
    let tables = vec![
        TableSyncConfig::new("exercises", "updated_at"),
        TableSyncConfig::new("exercises", "updated_at"),
    ];
    assert!(validate_table_order(&tables).is_err());
}

#[test]
fn missing_recency_column_is_rejected() {
    let tables = vec![TableSyncConfig::new("exercises", "")];
    assert!(validate_table_order(&tables).is_err());
}
