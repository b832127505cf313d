// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "stride.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;

// --- Queue ---
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_COMPLETED_RETENTION_DAYS: u32 = 7;
pub const DEFAULT_FAILED_RETENTION_DAYS: u32 = 30;

// --- Dispatch ---
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 300_000; // 5 minutes
pub const DEFAULT_APPLY_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_IDLE_WAKE_MS: u64 = 60_000;

// --- Circuit breaker ---
pub const DEFAULT_DEGRADED_AFTER: u32 = 3;
pub const DEFAULT_FAILED_AFTER: u32 = 8;
pub const DEFAULT_BREAKER_COOLDOWN_BASE_MS: u64 = 30_000;
pub const DEFAULT_BREAKER_COOLDOWN_MAX_MS: u64 = 900_000; // 15 minutes

// --- Reconciliation ---
pub const DEFAULT_PAGE_SIZE: usize = 500;
pub const DEFAULT_PAGE_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_TABLE_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TABLE_BACKOFF_BASE_MS: u64 = 500;
pub const DEFAULT_TABLE_BACKOFF_MAX_MS: u64 = 10_000;
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 15_000;

// --- Observability ---
pub const DEFAULT_LOG_FILTER: &str = "stride=info";
