//! v002: engine state singleton.

pub const MIGRATION_SQL: &str = "
CREATE TABLE IF NOT EXISTS engine_state (
    id                    INTEGER PRIMARY KEY CHECK (id = 1),
    status                TEXT NOT NULL DEFAULT 'healthy'
                          CHECK (status IN ('healthy', 'degraded', 'failed')),
    consecutive_failures  INTEGER NOT NULL DEFAULT 0,
    last_failure_at       INTEGER,
    backoff_until         INTEGER,
    network_state         TEXT NOT NULL DEFAULT 'online'
                          CHECK (network_state IN ('online', 'offline', 'poor')),
    last_network_change   INTEGER,
    updated_at            INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO engine_state (id) VALUES (1);
";
