use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which retention horizon a table belongs to. Reference data is usually
/// small and restored in full; transactional history is bounded by lookback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableCategory {
    #[default]
    Reference,
    Transactional,
}

/// Per-table reconciliation settings supplied by the business layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSyncConfig {
    pub table: String,
    /// Remote column used as the recency watermark.
    pub recency_column: String,
    /// How far back an incremental restore may look. `None` is unbounded.
    #[serde(default)]
    pub lookback_days: Option<u32>,
    #[serde(default)]
    pub category: TableCategory,
    /// Parent tables that must be restored first.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl TableSyncConfig {
    pub fn new(table: impl Into<String>, recency_column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            recency_column: recency_column.into(),
            lookback_days: None,
            category: TableCategory::Reference,
            depends_on: Vec::new(),
        }
    }

    pub fn transactional(mut self, lookback_days: u32) -> Self {
        self.category = TableCategory::Transactional;
        self.lookback_days = Some(lookback_days);
        self
    }

    pub fn depends_on(mut self, parent: impl Into<String>) -> Self {
        self.depends_on.push(parent.into());
        self
    }

    pub fn lookback(&self) -> Option<Duration> {
        self.lookback_days
            .map(|days| Duration::from_secs(u64::from(days) * 86_400))
    }
}
