//! Queries for the generic local row store.
//!
//! Upserts are row-level last-write-wins on `updated_at`: an incoming row
//! replaces the local copy only if it is at least as recent.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use stride_core::errors::StorageError;
use stride_core::models::RemoteRow;

use crate::{from_millis, from_millis_opt, to_millis, to_storage_err};

/// A row as held locally.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalRow {
    pub table: String,
    pub id: String,
    pub data: serde_json::Value,
    pub updated_at: DateTime<Utc>,
    pub is_synced: bool,
}

pub fn clear_table(conn: &Connection, table: &str) -> Result<u64, StorageError> {
    let deleted = conn
        .execute("DELETE FROM local_rows WHERE table_name = ?1", params![table])
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(deleted as u64)
}

/// Upsert rows as synced. Returns the number of rows inserted or updated.
pub fn upsert_synced(conn: &Connection, table: &str, rows: &[RemoteRow]) -> Result<u64, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO local_rows (table_name, row_id, data, updated_at, is_synced)
             VALUES (?1, ?2, ?3, ?4, 1)
             ON CONFLICT (table_name, row_id) DO UPDATE SET
                 data = excluded.data,
                 updated_at = excluded.updated_at,
                 is_synced = 1
             WHERE excluded.updated_at >= local_rows.updated_at",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut applied = 0u64;
    for row in rows {
        let data = serde_json::to_string(&row.data)
            .map_err(|e| to_storage_err(format!("serialize row {}: {e}", row.id)))?;
        applied += stmt
            .execute(params![table, row.id, data, to_millis(row.updated_at)])
            .map_err(|e| to_storage_err(e.to_string()))? as u64;
    }
    Ok(applied)
}

/// Write a locally edited row, not yet synced.
pub fn write_local(
    conn: &Connection,
    table: &str,
    id: &str,
    data: &serde_json::Value,
    updated_at: DateTime<Utc>,
) -> Result<(), StorageError> {
    let data = serde_json::to_string(data)
        .map_err(|e| to_storage_err(format!("serialize row {id}: {e}")))?;
    conn.execute(
        "INSERT INTO local_rows (table_name, row_id, data, updated_at, is_synced)
         VALUES (?1, ?2, ?3, ?4, 0)
         ON CONFLICT (table_name, row_id) DO UPDATE SET
             data = excluded.data, updated_at = excluded.updated_at, is_synced = 0",
        params![table, id, data, to_millis(updated_at)],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_row(conn: &Connection, table: &str, id: &str) -> Result<Option<LocalRow>, StorageError> {
    let raw = conn
        .query_row(
            "SELECT data, updated_at, is_synced FROM local_rows
             WHERE table_name = ?1 AND row_id = ?2",
            params![table, id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, bool>(2)?,
                ))
            },
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let Some((data, updated_at, is_synced)) = raw else {
        return Ok(None);
    };
    let data = serde_json::from_str(&data).map_err(|e| StorageError::CorruptionDetected {
        details: format!("local row {table}/{id}: {e}"),
    })?;
    Ok(Some(LocalRow {
        table: table.to_string(),
        id: id.to_string(),
        data,
        updated_at: from_millis(updated_at)?,
        is_synced,
    }))
}

pub fn max_recency(conn: &Connection, table: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
    let ms: Option<i64> = conn
        .query_row(
            "SELECT MAX(updated_at) FROM local_rows WHERE table_name = ?1 AND is_synced = 1",
            params![table],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    from_millis_opt(ms)
}

pub fn row_count(conn: &Connection, table: &str) -> Result<u64, StorageError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM local_rows WHERE table_name = ?1",
            params![table],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as u64)
}
