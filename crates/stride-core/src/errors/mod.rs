//! Error handling for Stride.
//! One error enum per subsystem, `thiserror` only, aggregated by `StrideError`.

pub mod apply_error;
pub mod config_error;
pub mod error_code;
pub mod gate_error;
pub mod queue_error;
pub mod reconcile_error;
pub mod remote_error;
pub mod storage_error;

pub use apply_error::ApplyError;
pub use config_error::ConfigError;
pub use error_code::StrideErrorCode;
pub use gate_error::GateError;
pub use queue_error::QueueError;
pub use reconcile_error::ReconcileError;
pub use remote_error::RemoteError;
pub use storage_error::StorageError;

/// Top-level error aggregating every subsystem via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum StrideError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Gate error: {0}")]
    Gate(#[from] GateError),

    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Login cancelled: sync engine is shutting down")]
    ShuttingDown,
}

impl StrideErrorCode for StrideError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            Self::Queue(e) => e.error_code(),
            Self::Gate(e) => e.error_code(),
            Self::Reconcile(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::ShuttingDown => error_code::DISPATCHER_UNAVAILABLE,
        }
    }
}

pub type StrideResult<T> = Result<T, StrideError>;
