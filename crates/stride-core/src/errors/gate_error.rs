//! Queue gate errors raised during the login flow.

use super::error_code::{self, StrideErrorCode};
use super::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("user switch blocked: {pending_count} unsynced mutation(s) belong to user {blocking_user_id}")]
    Blocked {
        blocking_user_id: String,
        pending_count: u64,
    },

    #[error("dispatcher is not running")]
    DispatcherUnavailable,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StrideErrorCode for GateError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Blocked { .. } => error_code::GATE_BLOCKED,
            Self::DispatcherUnavailable => error_code::DISPATCHER_UNAVAILABLE,
            Self::Storage(e) => e.error_code(),
        }
    }
}
