//! Connection management: a single serialized writer.
//!
//! The queue has exactly one writer during normal operation (the dispatcher),
//! and every statement is short, so reads share the same connection.

pub mod pragmas;
pub mod writer;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;

use stride_core::config::StorageConfig;
use stride_core::errors::StorageError;

use self::pragmas::apply_pragmas;
use crate::migrations;
use crate::to_storage_err;

pub struct DatabaseManager {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl DatabaseManager {
    /// Open a database at the given path, apply pragmas, run migrations.
    pub fn open(path: &Path, config: &StorageConfig) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, config)?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, &StorageConfig::default())?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Execute an operation with the serialized connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| to_storage_err("connection lock poisoned"))?;
        f(&guard)
    }

    /// Execute an operation inside a BEGIN IMMEDIATE transaction.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T, StorageError>,
    {
        self.with_conn(|conn| writer::with_immediate_transaction(conn, f))
    }

    /// Get the database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
