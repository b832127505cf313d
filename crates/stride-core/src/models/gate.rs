use serde::{Deserialize, Serialize};

/// Answer of the queue gate for a prospective user switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchCheck {
    pub allowed: bool,
    /// Unsynced entries that belong to someone other than the incoming user.
    pub pending_count: u64,
    /// Owner of the oldest blocking entry.
    pub blocking_user_id: Option<String>,
}

impl SwitchCheck {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            pending_count: 0,
            blocking_user_id: None,
        }
    }
}

/// Result of a forced final drain attempted before a user switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    pub attempted: u64,
    pub completed: u64,
    pub still_unsynced: u64,
    /// The deadline expired before every entry was attempted.
    pub timed_out: bool,
}
