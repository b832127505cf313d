//! Queries for the engine_state singleton.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use stride_core::constants::SINGLETON_ROW_ID;
use stride_core::errors::StorageError;
use stride_core::models::EngineState;

use crate::{from_millis_opt, to_millis, to_storage_err};

pub fn load(conn: &Connection) -> Result<EngineState, StorageError> {
    let raw = conn
        .query_row(
            "SELECT status, consecutive_failures, last_failure_at, backoff_until,
                    network_state, last_network_change
             FROM engine_state WHERE id = ?1",
            params![SINGLETON_ROW_ID],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                ))
            },
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let (status, failures, last_failure, backoff, network, network_change) = raw;
    Ok(EngineState {
        status: status
            .parse()
            .map_err(|details| StorageError::CorruptionDetected { details })?,
        consecutive_failures: failures,
        last_failure_at: from_millis_opt(last_failure)?,
        backoff_until: from_millis_opt(backoff)?,
        network_state: network
            .parse()
            .map_err(|details| StorageError::CorruptionDetected { details })?,
        last_network_change: from_millis_opt(network_change)?,
    })
}

pub fn save(conn: &Connection, state: &EngineState, now: DateTime<Utc>) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE engine_state SET status = ?2, consecutive_failures = ?3, last_failure_at = ?4,
             backoff_until = ?5, network_state = ?6, last_network_change = ?7, updated_at = ?8
         WHERE id = ?1",
        params![
            SINGLETON_ROW_ID,
            state.status.as_str(),
            state.consecutive_failures,
            state.last_failure_at.map(to_millis),
            state.backoff_until.map(to_millis),
            state.network_state.as_str(),
            state.last_network_change.map(to_millis),
            to_millis(now),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
