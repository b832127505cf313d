//! Outcome classification for remote appliers.

use super::error_code::{self, StrideErrorCode};

/// Error returned by a [`RemoteApplier`](crate::traits::RemoteApplier).
///
/// The dispatcher only cares about one question: is it worth trying again?
/// `Transient` and `Timeout` are retried with backoff and feed the circuit
/// breaker; `Rejected` fails the entry on the spot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("transient failure: {reason}")]
    Transient { reason: String },

    #[error("rejected by backend: {reason}")]
    Rejected { reason: String },

    #[error("timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
}

impl ApplyError {
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient {
            reason: reason.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

impl StrideErrorCode for ApplyError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transient { .. } => error_code::APPLY_TRANSIENT,
            Self::Rejected { .. } => error_code::APPLY_REJECTED,
            Self::Timeout { .. } => error_code::TIMEOUT,
        }
    }
}
