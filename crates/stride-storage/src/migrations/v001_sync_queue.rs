//! v001: durable mutation queue.
//!
//! The partial unique index makes "at most one entry processing" a storage
//! invariant, not only a dispatcher convention.

pub const MIGRATION_SQL: &str = "
CREATE TABLE IF NOT EXISTS sync_queue (
    seq             INTEGER PRIMARY KEY AUTOINCREMENT,
    id              TEXT NOT NULL UNIQUE,
    user_id         TEXT NOT NULL,
    mutation_code   TEXT NOT NULL,
    payload         TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'processing', 'completed', 'failed')),
    retry_count     INTEGER NOT NULL DEFAULT 0,
    max_retries     INTEGER NOT NULL DEFAULT 5,
    error_message   TEXT,
    scheduled_at    INTEGER NOT NULL,
    created_at      INTEGER NOT NULL,
    updated_at      INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sync_queue_dispatch
    ON sync_queue(status, scheduled_at, created_at);
CREATE INDEX IF NOT EXISTS idx_sync_queue_user
    ON sync_queue(user_id, status);
CREATE UNIQUE INDEX IF NOT EXISTS idx_sync_queue_single_processing
    ON sync_queue(status) WHERE status = 'processing';
";
