//! Storage-layer errors for SQLite operations.

use super::error_code::{self, StrideErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("database corruption detected: {details}")]
    CorruptionDetected { details: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl StrideErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SqliteError { .. } => error_code::STORAGE_ERROR,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::CorruptionDetected { .. } => error_code::DB_CORRUPT,
            Self::NotFound { .. } => error_code::NOT_FOUND,
        }
    }
}
