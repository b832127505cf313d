use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single row as delivered by the remote backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRow {
    pub id: String,
    /// Value of the table's recency column.
    pub updated_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

/// Request for one page of a remote table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub user_id: String,
    pub table: String,
    pub recency_column: String,
    /// Only rows with recency `>= since`. `None` requests the whole table.
    pub since: Option<DateTime<Utc>>,
    pub cursor: Option<String>,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemotePage {
    pub rows: Vec<RemoteRow>,
    /// Opaque cursor for the next page; `None` on the last page.
    pub next_cursor: Option<String>,
    pub total_known: Option<u64>,
}
