//! Schema migrations using PRAGMA user_version.

pub mod v001_sync_queue;
pub mod v002_engine_state;
pub mod v003_local_dataset;

use rusqlite::Connection;

use stride_core::errors::StorageError;

/// Latest schema version known to this build.
pub const LATEST_VERSION: u32 = 3;

/// Run all pending migrations. Each step commits together with its
/// `user_version` bump.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let current = current_version(conn)?;

    let migrations: &[(&str, u32)] = &[
        (v001_sync_queue::MIGRATION_SQL, 1),
        (v002_engine_state::MIGRATION_SQL, 2),
        (v003_local_dataset::MIGRATION_SQL, 3),
    ];

    for (sql, version) in migrations {
        if current >= *version {
            continue;
        }
        let fail = |e: rusqlite::Error| StorageError::MigrationFailed {
            version: *version,
            message: e.to_string(),
        };
        let tx = conn.unchecked_transaction().map_err(fail)?;
        tx.execute_batch(sql).map_err(fail)?;
        tx.pragma_update(None, "user_version", version).map_err(fail)?;
        tx.commit().map_err(fail)?;
        tracing::info!(version = version, "applied migration");
    }

    Ok(())
}

/// Get the current schema version.
pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StorageError::MigrationFailed {
            version: 0,
            message: e.to_string(),
        })
}
