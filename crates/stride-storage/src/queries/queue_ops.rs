//! Queries for the sync_queue table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use stride_core::errors::StorageError;
use stride_core::models::{EntryStatus, QueueEntry, QueueStats};

use crate::{from_millis, to_millis, to_storage_err};

const ENTRY_COLUMNS: &str = "seq, id, user_id, mutation_code, payload, status, retry_count,
     max_retries, error_message, scheduled_at, created_at, updated_at";

/// Insert a new entry. Returns the assigned sequence number.
pub fn insert_entry(conn: &Connection, entry: &QueueEntry) -> Result<i64, StorageError> {
    let payload = serde_json::to_string(&entry.payload)
        .map_err(|e| to_storage_err(format!("serialize payload: {e}")))?;
    conn.execute(
        "INSERT INTO sync_queue (id, user_id, mutation_code, payload, status, retry_count,
             max_retries, error_message, scheduled_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            entry.id,
            entry.user_id,
            entry.mutation_code,
            payload,
            entry.status.as_str(),
            entry.retry_count,
            entry.max_retries,
            entry.error_message,
            to_millis(entry.scheduled_at),
            to_millis(entry.created_at),
            to_millis(entry.updated_at),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_entry(conn: &Connection, id: &str) -> Result<Option<QueueEntry>, StorageError> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM sync_queue WHERE id = ?1");
    let raw = conn
        .query_row(&sql, params![id], read_raw)
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    raw.map(RawEntry::into_entry).transpose()
}

/// Oldest pending entry whose schedule has come due. Entries still in
/// backoff are skipped, so a slow entry never blocks the ones behind it.
pub fn next_eligible(
    conn: &Connection,
    now: DateTime<Utc>,
) -> Result<Option<QueueEntry>, StorageError> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM sync_queue
         WHERE status = 'pending' AND scheduled_at <= ?1
         ORDER BY created_at ASC, seq ASC
         LIMIT 1"
    );
    let raw = conn
        .query_row(&sql, params![to_millis(now)], read_raw)
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    raw.map(RawEntry::into_entry).transpose()
}

/// Earliest `scheduled_at` among pending entries that are not yet due.
pub fn next_scheduled_at(
    conn: &Connection,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, StorageError> {
    let ms: Option<i64> = conn
        .query_row(
            "SELECT MIN(scheduled_at) FROM sync_queue
             WHERE status = 'pending' AND scheduled_at > ?1",
            params![to_millis(now)],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    ms.map(from_millis).transpose()
}

/// `pending -> processing`. Returns false if the entry was not pending.
pub fn mark_processing(
    conn: &Connection,
    id: &str,
    now: DateTime<Utc>,
) -> Result<bool, StorageError> {
    let changed = conn
        .execute(
            "UPDATE sync_queue SET status = 'processing', updated_at = ?2
             WHERE id = ?1 AND status = 'pending'",
            params![id, to_millis(now)],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(changed == 1)
}

pub fn mark_completed(conn: &Connection, id: &str, now: DateTime<Utc>) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE sync_queue SET status = 'completed', error_message = NULL, updated_at = ?2
         WHERE id = ?1",
        params![id, to_millis(now)],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Terminal failure. `retry_count` is written as given so callers that
/// consumed an attempt can record it.
pub fn mark_failed(
    conn: &Connection,
    id: &str,
    retry_count: u32,
    error: &str,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE sync_queue SET status = 'failed', retry_count = ?2, error_message = ?3,
             updated_at = ?4
         WHERE id = ?1",
        params![id, retry_count, error, to_millis(now)],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Back to `pending` with a later schedule after a retryable failure.
pub fn reschedule(
    conn: &Connection,
    id: &str,
    retry_count: u32,
    scheduled_at: DateTime<Utc>,
    error: &str,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE sync_queue SET status = 'pending', retry_count = ?2, scheduled_at = ?3,
             error_message = ?4, updated_at = ?5
         WHERE id = ?1",
        params![id, retry_count, to_millis(scheduled_at), error, to_millis(now)],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn stats(conn: &Connection) -> Result<QueueStats, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT status, COUNT(*) FROM sync_queue GROUP BY status")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut stats = QueueStats::default();
    for row in rows {
        let (status, count) = row.map_err(|e| to_storage_err(e.to_string()))?;
        let count = count.max(0) as u64;
        match parse_status(&status)? {
            EntryStatus::Pending => stats.pending = count,
            EntryStatus::Processing => stats.processing = count,
            EntryStatus::Completed => stats.completed = count,
            EntryStatus::Failed => stats.failed = count,
        }
    }
    Ok(stats)
}

/// Entries with the given status in dispatch order.
pub fn list_by_status(
    conn: &Connection,
    status: EntryStatus,
) -> Result<Vec<QueueEntry>, StorageError> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM sync_queue WHERE status = ?1
         ORDER BY created_at ASC, seq ASC"
    );
    collect_entries(conn, &sql, params![status.as_str()])
}

/// Unsynced entries (pending, processing, failed) owned by `user_id`.
pub fn unsynced_for_user(conn: &Connection, user_id: &str) -> Result<Vec<QueueEntry>, StorageError> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM sync_queue
         WHERE user_id = ?1 AND status != 'completed'
         ORDER BY created_at ASC, seq ASC"
    );
    collect_entries(conn, &sql, params![user_id])
}

/// Unsynced entries not owned by `incoming_user`: their count and the owner
/// of the oldest one.
pub fn blocking_entries(
    conn: &Connection,
    incoming_user: &str,
) -> Result<(u64, Option<String>), StorageError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sync_queue
             WHERE user_id != ?1 AND status != 'completed'",
            params![incoming_user],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if count == 0 {
        return Ok((0, None));
    }
    let owner: Option<String> = conn
        .query_row(
            "SELECT user_id FROM sync_queue
             WHERE user_id != ?1 AND status != 'completed'
             ORDER BY created_at ASC, seq ASC
             LIMIT 1",
            params![incoming_user],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok((count as u64, owner))
}

/// Reset every `processing` entry to `pending`. Returns how many were reset.
pub fn reset_processing(conn: &Connection, now: DateTime<Utc>) -> Result<u64, StorageError> {
    let changed = conn
        .execute(
            "UPDATE sync_queue SET status = 'pending', updated_at = ?1
             WHERE status = 'processing'",
            params![to_millis(now)],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(changed as u64)
}

/// Make every backed-off pending entry due now.
pub fn pull_forward_pending(conn: &Connection, now: DateTime<Utc>) -> Result<u64, StorageError> {
    let now_ms = to_millis(now);
    let changed = conn
        .execute(
            "UPDATE sync_queue SET scheduled_at = ?1, updated_at = ?1
             WHERE status = 'pending' AND scheduled_at > ?1",
            params![now_ms],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(changed as u64)
}

/// `failed -> pending`. `retry_count` is kept; `max_retries` is raised so the
/// entry gets `budget` more attempts.
pub fn requeue_failed(
    conn: &Connection,
    id: &str,
    budget: u32,
    now: DateTime<Utc>,
) -> Result<bool, StorageError> {
    let now_ms = to_millis(now);
    let changed = conn
        .execute(
            "UPDATE sync_queue SET status = 'pending', max_retries = retry_count + ?3,
                 scheduled_at = ?2, error_message = NULL, updated_at = ?2
             WHERE id = ?1 AND status = 'failed'",
            params![id, now_ms, budget],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(changed == 1)
}

pub fn delete_failed(conn: &Connection, id: &str) -> Result<bool, StorageError> {
    let changed = conn
        .execute(
            "DELETE FROM sync_queue WHERE id = ?1 AND status = 'failed'",
            params![id],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(changed == 1)
}

fn collect_entries(
    conn: &Connection,
    sql: &str,
    args: impl rusqlite::Params,
) -> Result<Vec<QueueEntry>, StorageError> {
    let mut stmt = conn
        .prepare_cached(sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(args, read_raw)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        let raw = row.map_err(|e| to_storage_err(e.to_string()))?;
        out.push(raw.into_entry()?);
    }
    Ok(out)
}

/// Column values as stored, before domain conversion.
struct RawEntry {
    seq: i64,
    id: String,
    user_id: String,
    mutation_code: String,
    payload: String,
    status: String,
    retry_count: u32,
    max_retries: u32,
    error_message: Option<String>,
    scheduled_at: i64,
    created_at: i64,
    updated_at: i64,
}

fn read_raw(row: &Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok(RawEntry {
        seq: row.get(0)?,
        id: row.get(1)?,
        user_id: row.get(2)?,
        mutation_code: row.get(3)?,
        payload: row.get(4)?,
        status: row.get(5)?,
        retry_count: row.get(6)?,
        max_retries: row.get(7)?,
        error_message: row.get(8)?,
        scheduled_at: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

impl RawEntry {
    fn into_entry(self) -> Result<QueueEntry, StorageError> {
        let payload = serde_json::from_str(&self.payload).map_err(|e| {
            StorageError::CorruptionDetected {
                details: format!("queue entry {} payload: {e}", self.id),
            }
        })?;
        Ok(QueueEntry {
            status: parse_status(&self.status)?,
            scheduled_at: from_millis(self.scheduled_at)?,
            created_at: from_millis(self.created_at)?,
            updated_at: from_millis(self.updated_at)?,
            seq: self.seq,
            id: self.id,
            user_id: self.user_id,
            mutation_code: self.mutation_code,
            payload,
            retry_count: self.retry_count,
            max_retries: self.max_retries,
            error_message: self.error_message,
        })
    }
}

fn parse_status(s: &str) -> Result<EntryStatus, StorageError> {
    s.parse()
        .map_err(|details| StorageError::CorruptionDetected { details })
}
