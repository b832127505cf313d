//! PRAGMA configuration applied to every SQLite connection.
//!
//! WAL mode with FULL sync: an enqueue must survive the app being killed the
//! instant `enqueue` returns.

use rusqlite::Connection;

use stride_core::config::StorageConfig;
use stride_core::errors::StorageError;

use crate::to_storage_err;

/// Apply durability and safety pragmas to a connection.
pub fn apply_pragmas(conn: &Connection, config: &StorageConfig) -> Result<(), StorageError> {
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = FULL;
        PRAGMA busy_timeout = {};
        PRAGMA foreign_keys = ON;
        PRAGMA temp_store = MEMORY;
        ",
        config.busy_timeout_ms
    ))
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Verify that WAL mode is active on a connection. In-memory databases
/// report `memory` instead.
pub fn verify_wal_mode(conn: &Connection) -> Result<bool, StorageError> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}

/// `PRAGMA quick_check`; anything other than `ok` is corruption.
pub fn quick_check(conn: &Connection) -> Result<(), StorageError> {
    let result: String = conn
        .query_row("PRAGMA quick_check", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    if result.eq_ignore_ascii_case("ok") {
        Ok(())
    } else {
        Err(StorageError::CorruptionDetected { details: result })
    }
}
