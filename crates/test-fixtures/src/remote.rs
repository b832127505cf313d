use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;

use stride_core::errors::RemoteError;
use stride_core::models::{PageRequest, RemotePage, RemoteRow};
use stride_core::traits::RemoteSource;

use crate::load_fixture;

/// Failure injected into the next fetch of one table.
#[derive(Debug, Clone)]
enum Injected {
    Error(RemoteError),
    Hang,
}

#[derive(Debug, Deserialize)]
struct DatasetFixture {
    tables: HashMap<String, Vec<RemoteRow>>,
}

/// A remote dataset held in memory. Rows are served in `(updated_at, id)`
/// order with numeric offset cursors, so pagination is stable.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    tables: Mutex<HashMap<String, Vec<RemoteRow>>>,
    failures: Mutex<HashMap<String, VecDeque<Injected>>>,
    requests: Mutex<Vec<PageRequest>>,
    report_totals: bool,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate from a JSON fixture of the form `{"tables": {"name": [rows]}}`.
    pub fn from_fixture(relative_path: &str) -> Self {
        let fixture: DatasetFixture = load_fixture(relative_path);
        let remote = Self::new();
        for (table, rows) in fixture.tables {
            remote.put_rows(&table, rows);
        }
        remote
    }

    /// Report `total_known` on every page.
    pub fn with_totals(mut self) -> Self {
        self.report_totals = true;
        self
    }

    /// Insert or replace rows by id.
    pub fn put_rows(&self, table: &str, rows: impl IntoIterator<Item = RemoteRow>) {
        let mut tables = self.tables.lock().unwrap();
        let existing = tables.entry(table.to_string()).or_default();
        for row in rows {
            existing.retain(|r| r.id != row.id);
            existing.push(row);
        }
        existing.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then_with(|| a.id.cmp(&b.id)));
    }

    pub fn rows(&self, table: &str) -> Vec<RemoteRow> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Fail the next `times` fetches of `table` with `error`.
    pub fn fail_next(&self, table: &str, times: usize, error: RemoteError) {
        let mut failures = self.failures.lock().unwrap();
        let queue = failures.entry(table.to_string()).or_default();
        queue.extend(std::iter::repeat(Injected::Error(error)).take(times));
    }

    /// Make the next fetch of `table` never return.
    pub fn hang_next(&self, table: &str) {
        self.failures
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push_back(Injected::Hang);
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, table: &str) -> Vec<PageRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.table == table)
            .collect()
    }
}

#[async_trait]
impl RemoteSource for InMemoryRemote {
    async fn fetch_page(&self, request: &PageRequest) -> Result<RemotePage, RemoteError> {
        self.requests.lock().unwrap().push(request.clone());

        let injected = self
            .failures
            .lock()
            .unwrap()
            .get_mut(&request.table)
            .and_then(VecDeque::pop_front);
        match injected {
            Some(Injected::Error(e)) => return Err(e),
            Some(Injected::Hang) => {
                std::future::pending::<()>().await;
            }
            None => {}
        }

        let matching: Vec<RemoteRow> = self
            .rows(&request.table)
            .into_iter()
            .filter(|r| request.since.map_or(true, |since| r.updated_at >= since))
            .collect();

        let offset = match &request.cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| RemoteError::Malformed {
                    reason: format!("bad cursor {c}"),
                })?,
            None => 0,
        };
        let end = (offset + request.limit).min(matching.len());
        let rows = matching.get(offset..end).map(<[RemoteRow]>::to_vec).unwrap_or_default();
        let next_cursor = (end < matching.len()).then(|| end.to_string());

        Ok(RemotePage {
            rows,
            next_cursor,
            total_known: self.report_totals.then_some(matching.len() as u64),
        })
    }
}
