//! Errors from the remote read side used by reconciliation.

use super::error_code::{self, StrideErrorCode};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("network error: {reason}")]
    Network { reason: String },

    #[error("remote rejected request: {reason}")]
    Rejected { reason: String },

    #[error("page fetch timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("malformed remote response: {reason}")]
    Malformed { reason: String },
}

impl RemoteError {
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    /// Network failures and timeouts are worth another attempt; a rejected
    /// or malformed response will not change on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }
}

impl StrideErrorCode for RemoteError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => error_code::TIMEOUT,
            _ => error_code::REMOTE_ERROR,
        }
    }
}
