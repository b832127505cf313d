//! Write connection utilities: BEGIN IMMEDIATE transactions.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use stride_core::errors::StorageError;

use crate::to_storage_err;

/// Execute a write operation inside a BEGIN IMMEDIATE transaction.
/// The write lock is taken at transaction start; the closure's effects either
/// commit durably or roll back when the transaction is dropped.
pub fn with_immediate_transaction<F, T>(conn: &Connection, f: F) -> Result<T, StorageError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, StorageError>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|e| to_storage_err(format!("failed to begin immediate transaction: {e}")))?;

    let result = f(&tx)?;

    tx.commit()
        .map_err(|e| to_storage_err(format!("failed to commit: {e}")))?;

    Ok(result)
}
