//! Queries for the local_dataset marker.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use stride_core::constants::SINGLETON_ROW_ID;
use stride_core::errors::StorageError;
use stride_core::models::LocalDatasetMarker;

use crate::{from_millis_opt, to_millis, to_storage_err};

pub fn load_marker(conn: &Connection) -> Result<LocalDatasetMarker, StorageError> {
    let (owner, schema_version, state, mode, restored_at) = conn
        .query_row(
            "SELECT owner_user_id, schema_version, restore_state, last_restore_mode,
                    last_restored_at
             FROM local_dataset WHERE id = ?1",
            params![SINGLETON_ROW_ID],
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<u32>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                ))
            },
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let corrupt = |details: String| StorageError::CorruptionDetected { details };
    Ok(LocalDatasetMarker {
        owner_user_id: owner,
        schema_version,
        restore_state: state.parse().map_err(corrupt)?,
        last_restore_mode: mode.map(|m| m.parse()).transpose().map_err(corrupt)?,
        last_restored_at: from_millis_opt(restored_at)?,
    })
}

pub fn save_marker(
    conn: &Connection,
    marker: &LocalDatasetMarker,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE local_dataset SET owner_user_id = ?2, schema_version = ?3, restore_state = ?4,
             last_restore_mode = ?5, last_restored_at = ?6, updated_at = ?7
         WHERE id = ?1",
        params![
            SINGLETON_ROW_ID,
            marker.owner_user_id,
            marker.schema_version,
            marker.restore_state.as_str(),
            marker.last_restore_mode.map(|m| m.as_str()),
            marker.last_restored_at.map(to_millis),
            to_millis(now),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
