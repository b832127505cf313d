//! v003: dataset ownership marker and the local row store.

pub const MIGRATION_SQL: &str = "
CREATE TABLE IF NOT EXISTS local_dataset (
    id                 INTEGER PRIMARY KEY CHECK (id = 1),
    owner_user_id      TEXT,
    schema_version     INTEGER,
    restore_state      TEXT NOT NULL DEFAULT 'empty'
                       CHECK (restore_state IN ('empty', 'resetting', 'ready')),
    last_restore_mode  TEXT,
    last_restored_at   INTEGER,
    updated_at         INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO local_dataset (id) VALUES (1);

CREATE TABLE IF NOT EXISTS local_rows (
    table_name  TEXT NOT NULL,
    row_id      TEXT NOT NULL,
    data        TEXT NOT NULL,
    updated_at  INTEGER NOT NULL,
    is_synced   INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (table_name, row_id)
);

CREATE INDEX IF NOT EXISTS idx_local_rows_recency
    ON local_rows(table_name, updated_at);
";
