//! Queue gate: refuses a user switch while another user's mutations are
//! still unsynced. Data is never discarded to make a switch possible.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use stride_core::errors::{GateError, StorageError};
use stride_core::models::SwitchCheck;
use stride_storage::StorageEngine;

use crate::dispatch::DispatcherHandle;

pub struct QueueGate {
    store: Arc<StorageEngine>,
}

impl QueueGate {
    pub fn new(store: Arc<StorageEngine>) -> Self {
        Self { store }
    }

    /// Count unsynced entries (pending, processing, failed) that belong to
    /// anyone but `incoming_user`.
    pub fn can_switch_user(&self, incoming_user: &str) -> Result<SwitchCheck, StorageError> {
        let (pending_count, blocking_user_id) = self.store.blocking_entries(incoming_user)?;
        if pending_count == 0 {
            return Ok(SwitchCheck::allowed());
        }
        Ok(SwitchCheck {
            allowed: false,
            pending_count,
            blocking_user_id,
        })
    }

    /// Check the gate; when `force_drain` is set and the switch is blocked,
    /// give every blocking user's pending entries one final attempt through
    /// the dispatcher before deciding. Failed entries are not re-sent and
    /// keep blocking until retried or discarded. Fails with
    /// `GateError::Blocked` if any foreign entry is still unsynced.
    pub async fn admit(
        &self,
        incoming_user: &str,
        force_drain: bool,
        dispatcher: &DispatcherHandle,
        timeout: Duration,
    ) -> Result<SwitchCheck, GateError> {
        let mut check = self.can_switch_user(incoming_user)?;
        if check.allowed {
            return Ok(check);
        }

        if force_drain {
            let deadline = Instant::now() + timeout;
            let mut drained: Vec<String> = Vec::new();
            while let Some(blocker) = check.blocking_user_id.clone() {
                // A user already drained once is not retried within one login.
                if drained.contains(&blocker) {
                    break;
                }
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                let report = dispatcher.drain(&blocker, remaining).await?;
                drained.push(blocker);
                check = self.can_switch_user(incoming_user)?;
                if check.allowed || report.timed_out {
                    break;
                }
            }
        }

        if check.allowed {
            return Ok(check);
        }
        let blocking_user_id = check.blocking_user_id.unwrap_or_default();
        tracing::warn!(
            incoming_user,
            blocking_user_id = %blocking_user_id,
            pending = check.pending_count,
            "user switch blocked by unsynced mutations"
        );
        Err(GateError::Blocked {
            blocking_user_id,
            pending_count: check.pending_count,
        })
    }
}
