//! StrideErrorCode trait for the host-app boundary.

/// Every error enum implements this so the mobile host receives a stable,
/// machine-readable code alongside the human message.
pub trait StrideErrorCode {
    /// Returns the error code string (e.g., "QUEUE_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted boundary string: `[ERROR_CODE] message`.
    fn host_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

// Error code constants for the host boundary.
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const DB_CORRUPT: &str = "DB_CORRUPT";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const QUEUE_ERROR: &str = "QUEUE_ERROR";
pub const NO_ACTIVE_USER: &str = "NO_ACTIVE_USER";
pub const APPLY_TRANSIENT: &str = "APPLY_TRANSIENT";
pub const APPLY_REJECTED: &str = "APPLY_REJECTED";
pub const TIMEOUT: &str = "TIMEOUT";
pub const REMOTE_ERROR: &str = "REMOTE_ERROR";
pub const GATE_BLOCKED: &str = "GATE_BLOCKED";
pub const DISPATCHER_UNAVAILABLE: &str = "DISPATCHER_UNAVAILABLE";
pub const RECONCILE_FAILED: &str = "RECONCILE_FAILED";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
