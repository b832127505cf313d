use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;

use stride_core::config::{BreakerConfig, DispatchConfig};
use stride_core::errors::{ApplyError, StorageError};
use stride_core::models::{DrainReport, EngineState, EntryStatus, NetworkState, QueueEntry};
use stride_core::traits::{decode_mutation, Clock, Mutation, RemoteApplier};
use stride_storage::StorageEngine;

use crate::backoff::backoff;
use crate::breaker;
use crate::time::{after, until};

/// What one dispatch step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed {
        entry_id: String,
    },
    /// Transient failure; the entry is pending again with a later schedule.
    Retrying {
        entry_id: String,
        retry_count: u32,
        next_attempt_at: DateTime<Utc>,
    },
    /// Terminal: retries exhausted, rejected by the backend, or undecodable.
    Failed {
        entry_id: String,
        reason: String,
    },
    /// The selected entry was no longer pending when it was claimed.
    Skipped {
        entry_id: String,
    },
    /// Nothing due. `next_due` is the earliest backed-off entry, if any.
    Idle {
        next_due: Option<DateTime<Utc>>,
    },
    /// Offline, or the breaker cooldown has not elapsed.
    Suspended {
        until: Option<DateTime<Utc>>,
    },
}

impl DispatchOutcome {
    /// Whether this step claimed an entry.
    pub fn made_progress(&self) -> bool {
        !matches!(self, Self::Idle { .. } | Self::Suspended { .. })
    }
}

/// Drains the queue one entry at a time and owns the engine state.
///
/// Normally driven by the background task started with [`Dispatcher::spawn`];
/// tests may call [`Dispatcher::dispatch_next`] directly for deterministic
/// stepping.
pub struct Dispatcher<M: Mutation> {
    store: Arc<StorageEngine>,
    applier: Arc<dyn RemoteApplier<M>>,
    clock: Arc<dyn Clock>,
    dispatch: DispatchConfig,
    breaker: BreakerConfig,
    state: EngineState,
    state_tx: watch::Sender<EngineState>,
}

impl<M: Mutation> Dispatcher<M> {
    /// Load the persisted engine state and build a dispatcher around it.
    pub fn new(
        store: Arc<StorageEngine>,
        applier: Arc<dyn RemoteApplier<M>>,
        clock: Arc<dyn Clock>,
        dispatch: DispatchConfig,
        breaker: BreakerConfig,
    ) -> Result<Self, StorageError> {
        let state = store.load_engine_state()?;
        let (state_tx, _) = watch::channel(state.clone());
        Ok(Self {
            store,
            applier,
            clock,
            dispatch,
            breaker,
            state,
            state_tx,
        })
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state_tx.subscribe()
    }

    /// Run one step of the loop: pick the oldest due entry and try it.
    pub async fn dispatch_next(&mut self) -> Result<DispatchOutcome, StorageError> {
        let now = self.clock.now();
        if !self.state.may_dispatch(now) {
            return Ok(DispatchOutcome::Suspended {
                until: self.state.backoff_until,
            });
        }

        match self.store.next_eligible(now)? {
            Some(entry) => self.attempt(entry, self.dispatch.apply_timeout()).await,
            None => Ok(DispatchOutcome::Idle {
                next_due: self.store.next_scheduled_at(now)?,
            }),
        }
    }

    /// Apply a network transition. Returns true when connectivity came back.
    pub fn set_network_state(&mut self, network: NetworkState) -> Result<bool, StorageError> {
        let now = self.clock.now();
        let reconnected = breaker::on_network_change(&mut self.state, network, now);
        if reconnected {
            let pulled = self.store.pull_forward_pending(now)?;
            tracing::info!(pulled, "connectivity restored, backed-off entries due now");
        }
        self.persist_state(now)?;
        Ok(reconnected)
    }

    /// One final attempt for every pending entry of `user_id` until
    /// `deadline`, ignoring schedules and the breaker. Failed entries are
    /// never re-sent; they stay unsynced until the business layer retries or
    /// discards them.
    pub async fn drain_user(
        &mut self,
        user_id: &str,
        deadline: Instant,
    ) -> Result<DrainReport, StorageError> {
        let mut report = DrainReport::default();
        let pending = self
            .store
            .unsynced_for_user(user_id)?
            .into_iter()
            .filter(|entry| entry.status == EntryStatus::Pending);
        for entry in pending {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                report.timed_out = true;
                break;
            }
            report.attempted += 1;
            let outcome = self.attempt(entry, remaining).await?;
            if matches!(outcome, DispatchOutcome::Completed { .. }) {
                report.completed += 1;
            }
        }
        report.still_unsynced = self.store.unsynced_for_user(user_id)?.len() as u64;
        tracing::info!(
            user_id,
            attempted = report.attempted,
            completed = report.completed,
            still_unsynced = report.still_unsynced,
            timed_out = report.timed_out,
            "forced drain finished"
        );
        Ok(report)
    }

    /// How long the task may sleep when waiting for `at`.
    pub(super) fn wait_for(&self, at: Option<DateTime<Utc>>) -> Duration {
        let idle = self.dispatch.idle_wake();
        at.map_or(idle, |at| until(self.clock.now(), at).min(idle))
    }

    async fn attempt(
        &mut self,
        entry: QueueEntry,
        budget: Duration,
    ) -> Result<DispatchOutcome, StorageError> {
        let now = self.clock.now();
        if !self.store.mark_processing(&entry.id, now)? {
            return Ok(DispatchOutcome::Skipped { entry_id: entry.id });
        }

        let mutation = match decode_mutation::<M>(&entry.mutation_code, &entry.payload) {
            Ok(mutation) => mutation,
            Err(e) => {
                let reason = e.to_string();
                self.store
                    .mark_failed(&entry.id, entry.retry_count, &reason, now)?;
                tracing::error!(
                    entry_id = %entry.id,
                    mutation_code = %entry.mutation_code,
                    error = %reason,
                    "undecodable queue entry failed without retry"
                );
                return Ok(DispatchOutcome::Failed {
                    entry_id: entry.id,
                    reason,
                });
            }
        };

        let result = self.apply(&entry.id, &mutation, budget).await;
        let now = self.clock.now();
        match result {
            Ok(()) => {
                self.store.mark_completed(&entry.id, now)?;
                breaker::on_success(&mut self.state);
                self.persist_state(now)?;
                tracing::debug!(
                    entry_id = %entry.id,
                    mutation_code = %entry.mutation_code,
                    "mutation applied"
                );
                Ok(DispatchOutcome::Completed { entry_id: entry.id })
            }
            Err(error) => self.record_failure(entry, error, now),
        }
    }

    fn record_failure(
        &mut self,
        entry: QueueEntry,
        error: ApplyError,
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome, StorageError> {
        let retry_count = entry.retry_count.saturating_add(1);
        let reason = error.to_string();

        if !error.is_transient() {
            self.store.mark_failed(&entry.id, retry_count, &reason, now)?;
            tracing::warn!(
                entry_id = %entry.id,
                mutation_code = %entry.mutation_code,
                error = %reason,
                "mutation rejected by backend"
            );
            return Ok(DispatchOutcome::Failed {
                entry_id: entry.id,
                reason,
            });
        }

        breaker::on_failure(&mut self.state, now, &self.breaker);
        self.persist_state(now)?;

        if retry_count >= entry.max_retries {
            self.store.mark_failed(&entry.id, retry_count, &reason, now)?;
            tracing::warn!(
                entry_id = %entry.id,
                mutation_code = %entry.mutation_code,
                retry_count,
                error = %reason,
                "retries exhausted, mutation failed"
            );
            return Ok(DispatchOutcome::Failed {
                entry_id: entry.id,
                reason,
            });
        }

        let next_attempt_at = after(now, backoff(retry_count, &self.dispatch));
        self.store
            .reschedule(&entry.id, retry_count, next_attempt_at, &reason, now)?;
        tracing::debug!(
            entry_id = %entry.id,
            mutation_code = %entry.mutation_code,
            retry_count,
            next_attempt_at = %next_attempt_at,
            error = %reason,
            "mutation rescheduled"
        );
        Ok(DispatchOutcome::Retrying {
            entry_id: entry.id,
            retry_count,
            next_attempt_at,
        })
    }

    async fn apply(&self, key: &str, mutation: &M, budget: Duration) -> Result<(), ApplyError> {
        let limit = budget.min(self.dispatch.apply_timeout());
        match tokio::time::timeout(limit, self.applier.apply(key, mutation)).await {
            Ok(result) => result,
            Err(_) => Err(ApplyError::Timeout {
                after_ms: limit.as_millis() as u64,
            }),
        }
    }

    fn persist_state(&mut self, now: DateTime<Utc>) -> Result<(), StorageError> {
        self.store.save_engine_state(&self.state, now)?;
        self.state_tx.send_replace(self.state.clone());
        Ok(())
    }
}
