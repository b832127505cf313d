//! Reconciliation errors.

use super::error_code::{self, StrideErrorCode};
use super::{RemoteError, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("restore of table {table} failed after {attempts} attempt(s): {reason}")]
    TableFailed {
        table: String,
        attempts: u32,
        reason: String,
        completed_tables: Vec<String>,
    },

    #[error("invalid table configuration: {reason}")]
    InvalidTableConfig { reason: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StrideErrorCode for ReconcileError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::TableFailed { .. } => error_code::RECONCILE_FAILED,
            Self::InvalidTableConfig { .. } => error_code::CONFIG_ERROR,
            Self::Remote(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
        }
    }
}
