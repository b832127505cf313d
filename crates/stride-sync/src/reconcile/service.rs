use std::sync::Arc;

use chrono::{DateTime, Utc};

use stride_core::config::{validate_table_order, ReconcileConfig};
use stride_core::errors::{ReconcileError, RemoteError};
use stride_core::models::{
    LocalDatasetMarker, PageRequest, ReconcilePhase, ReconcileProgress, ReconcileReport,
    RemotePage, RestoreMode, RestoreState, TableReport, TableSyncConfig,
};
use stride_core::traits::{Clock, LocalTableStore, ProgressSink, RemoteSource};

use super::decision::{decide, Decision};
use crate::backoff::table_retry_delay;

/// Pulls remote rows into the local table store at login.
///
/// Tables are opaque names taken from configuration and are processed in
/// the configured order, parents before children.
pub struct ReconciliationService {
    local: Arc<dyn LocalTableStore>,
    remote: Arc<dyn RemoteSource>,
    clock: Arc<dyn Clock>,
    config: ReconcileConfig,
}

impl ReconciliationService {
    pub fn new(
        local: Arc<dyn LocalTableStore>,
        remote: Arc<dyn RemoteSource>,
        clock: Arc<dyn Clock>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            local,
            remote,
            clock,
            config,
        }
    }

    /// The mode a login of `user_id` would use right now.
    pub fn decide_for(&self, user_id: &str) -> Result<Decision, ReconcileError> {
        let marker = self.local.dataset_marker()?;
        Ok(decide(&marker, user_id, self.config.schema_version))
    }

    pub async fn reconcile(
        &self,
        user_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<ReconcileReport, ReconcileError> {
        validate_table_order(&self.config.tables).map_err(|e| {
            ReconcileError::InvalidTableConfig {
                reason: e.to_string(),
            }
        })?;

        let decision = self.decide_for(user_id)?;
        tracing::info!(
            user_id,
            mode = %decision.mode,
            reason = %decision.reason,
            tables = self.config.tables.len(),
            "reconciling local dataset"
        );

        let started = self.clock.now();
        let mut marker = match decision.mode {
            RestoreMode::FullReset => {
                let marker = LocalDatasetMarker {
                    owner_user_id: Some(user_id.to_string()),
                    schema_version: Some(self.config.schema_version),
                    restore_state: RestoreState::Resetting,
                    last_restore_mode: Some(RestoreMode::FullReset),
                    last_restored_at: None,
                };
                self.local.set_dataset_marker(&marker, started)?;
                marker
            }
            RestoreMode::Incremental => self.local.dataset_marker()?,
        };

        let tables = self.run_tables(decision.mode, user_id, started, progress).await?;

        marker.restore_state = RestoreState::Ready;
        marker.last_restore_mode = Some(decision.mode);
        marker.last_restored_at = Some(started);
        self.local.set_dataset_marker(&marker, self.clock.now())?;

        let report = ReconcileReport {
            mode: decision.mode,
            tables,
        };
        tracing::info!(
            user_id,
            mode = %decision.mode,
            rows = report.rows_applied(),
            "reconciliation complete"
        );
        Ok(report)
    }

    async fn run_tables(
        &self,
        mode: RestoreMode,
        user_id: &str,
        now: DateTime<Utc>,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<TableReport>, ReconcileError> {
        let reporter = Reporter { sink: progress, mode };
        let mut done: Vec<TableReport> = Vec::with_capacity(self.config.tables.len());
        for table in &self.config.tables {
            let report = self
                .restore_with_retry(&reporter, user_id, table, now, &done)
                .await?;
            done.push(report);
        }
        Ok(done)
    }

    async fn restore_with_retry(
        &self,
        reporter: &Reporter<'_>,
        user_id: &str,
        table: &TableSyncConfig,
        now: DateTime<Utc>,
        done: &[TableReport],
    ) -> Result<TableReport, ReconcileError> {
        let max_attempts = self.config.table_max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.restore_table(reporter, user_id, table, now).await {
                Ok((rows_done, rows_applied)) => {
                    reporter.emit(ReconcilePhase::TableCompleted, &table.table, rows_done, None);
                    return Ok(TableReport {
                        table: table.table.clone(),
                        rows_applied,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    let retryable = matches!(&e, ReconcileError::Remote(r) if r.is_retryable());
                    if !retryable || attempt >= max_attempts {
                        reporter.failed(&table.table, &e);
                        tracing::error!(
                            table = %table.table,
                            attempts = attempt,
                            error = %e,
                            "table restore failed"
                        );
                        return Err(ReconcileError::TableFailed {
                            table: table.table.clone(),
                            attempts: attempt,
                            reason: e.to_string(),
                            completed_tables: done.iter().map(|t| t.table.clone()).collect(),
                        });
                    }
                    let delay = table_retry_delay(attempt, &self.config);
                    attempt += 1;
                    tracing::warn!(
                        table = %table.table,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying table restore"
                    );
                    reporter.emit(ReconcilePhase::Retrying { attempt }, &table.table, 0, None);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One pass over a table. Returns `(rows received, rows applied)`.
    async fn restore_table(
        &self,
        reporter: &Reporter<'_>,
        user_id: &str,
        table: &TableSyncConfig,
        now: DateTime<Utc>,
    ) -> Result<(u64, u64), ReconcileError> {
        let since = match reporter.mode {
            RestoreMode::FullReset => {
                reporter.emit(ReconcilePhase::Wiping, &table.table, 0, None);
                let removed = self.local.clear_table(&table.table)?;
                tracing::debug!(table = %table.table, removed, "local table wiped");
                None
            }
            RestoreMode::Incremental => self.watermark(table, now)?,
        };

        let mut cursor: Option<String> = None;
        let mut rows_done = 0u64;
        let mut rows_applied = 0u64;
        loop {
            let request = PageRequest {
                user_id: user_id.to_string(),
                table: table.table.clone(),
                recency_column: table.recency_column.clone(),
                since,
                cursor: cursor.take(),
                limit: self.config.page_size,
            };
            let page = self.fetch(&request).await?;
            rows_applied += self.local.upsert_rows(&table.table, &page.rows)?;
            rows_done += page.rows.len() as u64;
            reporter.emit(ReconcilePhase::Restoring, &table.table, rows_done, page.total_known);

            match page.next_cursor {
                Some(next) if !page.rows.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        Ok((rows_done, rows_applied))
    }

    /// `max(local max recency, now - lookback)`; `None` fetches everything.
    fn watermark(
        &self,
        table: &TableSyncConfig,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, ReconcileError> {
        let local_max = self.local.max_recency(&table.table)?;
        let floor = table
            .lookback()
            .and_then(|lookback| chrono::Duration::from_std(lookback).ok())
            .and_then(|lookback| now.checked_sub_signed(lookback));
        Ok(match (local_max, floor) {
            (Some(local), Some(floor)) => Some(local.max(floor)),
            (local, floor) => local.or(floor),
        })
    }

    async fn fetch(&self, request: &PageRequest) -> Result<RemotePage, RemoteError> {
        let limit = self.config.page_timeout();
        match tokio::time::timeout(limit, self.remote.fetch_page(request)).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout {
                after_ms: limit.as_millis() as u64,
            }),
        }
    }
}

struct Reporter<'a> {
    sink: &'a dyn ProgressSink,
    mode: RestoreMode,
}

impl Reporter<'_> {
    fn emit(&self, phase: ReconcilePhase, table: &str, rows_done: u64, total_known: Option<u64>) {
        self.sink.on_progress(&ReconcileProgress {
            mode: self.mode,
            phase,
            table: table.to_string(),
            rows_done,
            total_known,
            error: None,
        });
    }

    fn failed(&self, table: &str, error: &ReconcileError) {
        self.sink.on_progress(&ReconcileProgress {
            mode: self.mode,
            phase: ReconcilePhase::TableFailed,
            table: table.to_string(),
            rows_done: 0,
            total_known: None,
            error: Some(error.to_string()),
        });
    }
}
