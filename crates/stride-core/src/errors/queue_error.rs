//! Mutation queue errors. These surface synchronously from `enqueue` and from
//! the manual-handling operations on failed entries.

use super::error_code::{self, StrideErrorCode};
use super::StorageError;
use crate::models::EntryStatus;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("failed to encode mutation: {reason}")]
    Encode { reason: String },

    #[error("no active user; mutations cannot be attributed")]
    NoActiveUser,

    #[error("queue entry {id} is {status}, expected {expected}")]
    InvalidState {
        id: String,
        status: EntryStatus,
        expected: EntryStatus,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StrideErrorCode for QueueError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Encode { .. } | Self::InvalidState { .. } => error_code::QUEUE_ERROR,
            Self::NoActiveUser => error_code::NO_ACTIVE_USER,
            Self::Storage(e) => e.error_code(),
        }
    }
}
