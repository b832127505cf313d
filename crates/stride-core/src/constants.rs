/// Stride system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Id of the singleton rows (engine state, dataset marker).
pub const SINGLETON_ROW_ID: i64 = 1;

/// Upper bound on rows written in one local upsert transaction.
pub const MAX_UPSERT_BATCH: usize = 1_000;

/// Exponent cap for backoff doubling; keeps `2^n` well inside `u64`.
pub const MAX_BACKOFF_EXPONENT: u32 = 30;
