use std::fmt;

use stride_core::models::{LocalDatasetMarker, RestoreMode, RestoreState};

/// Why a mode was chosen. Logged with every reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    /// Nothing has ever been restored, so there is no watermark.
    NoLocalData,
    /// The previous restore did not finish.
    InterruptedRestore,
    OwnerChanged,
    SchemaChanged,
    /// Same owner, same schema, completed restore.
    UpToDateOwner,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoLocalData => "no local data",
            Self::InterruptedRestore => "interrupted restore",
            Self::OwnerChanged => "owner changed",
            Self::SchemaChanged => "schema version changed",
            Self::UpToDateOwner => "same owner, ready",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub mode: RestoreMode,
    pub reason: DecisionReason,
}

/// Pure choice of restore mode. The first matching rule wins:
/// interrupted or never-completed restore, then owner, then schema, then
/// the presence of a watermark.
pub fn decide(
    marker: &LocalDatasetMarker,
    incoming_user: &str,
    expected_schema_version: u32,
) -> Decision {
    let full = |reason| Decision {
        mode: RestoreMode::FullReset,
        reason,
    };

    match marker.restore_state {
        RestoreState::Empty => return full(DecisionReason::NoLocalData),
        RestoreState::Resetting => return full(DecisionReason::InterruptedRestore),
        RestoreState::Ready => {}
    }
    if marker.owner_user_id.as_deref() != Some(incoming_user) {
        return full(DecisionReason::OwnerChanged);
    }
    if marker.schema_version != Some(expected_schema_version) {
        return full(DecisionReason::SchemaChanged);
    }
    if marker.last_restored_at.is_none() {
        return full(DecisionReason::NoLocalData);
    }
    Decision {
        mode: RestoreMode::Incremental,
        reason: DecisionReason::UpToDateOwner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ready(owner: &str, schema: u32) -> LocalDatasetMarker {
        LocalDatasetMarker {
            owner_user_id: Some(owner.to_string()),
            schema_version: Some(schema),
            restore_state: RestoreState::Ready,
            last_restore_mode: Some(RestoreMode::FullReset),
            last_restored_at: Some(Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn same_owner_ready_is_incremental() {
        let d = decide(&ready("alice", 2), "alice", 2);
        assert_eq!(d.mode, RestoreMode::Incremental);
        assert_eq!(d.reason, DecisionReason::UpToDateOwner);
    }

    #[test]
    fn empty_marker_is_full_reset() {
        let d = decide(&LocalDatasetMarker::default(), "alice", 1);
        assert_eq!(d.mode, RestoreMode::FullReset);
        assert_eq!(d.reason, DecisionReason::NoLocalData);
    }

    #[test]
    fn different_owner_is_full_reset() {
        let d = decide(&ready("bob", 2), "alice", 2);
        assert_eq!(d.reason, DecisionReason::OwnerChanged);
    }

    #[test]
    fn schema_mismatch_or_absence_is_full_reset() {
        assert_eq!(
            decide(&ready("alice", 1), "alice", 2).reason,
            DecisionReason::SchemaChanged
        );
        let mut marker = ready("alice", 2);
        marker.schema_version = None;
        assert_eq!(
            decide(&marker, "alice", 2).reason,
            DecisionReason::SchemaChanged
        );
    }

    #[test]
    fn interrupted_reset_for_same_owner_is_full_reset() {
        let mut marker = ready("alice", 2);
        marker.restore_state = RestoreState::Resetting;
        assert_eq!(
            decide(&marker, "alice", 2).reason,
            DecisionReason::InterruptedRestore
        );
    }

    #[test]
    fn missing_watermark_is_full_reset() {
        let mut marker = ready("alice", 2);
        marker.last_restored_at = None;
        assert_eq!(decide(&marker, "alice", 2).mode, RestoreMode::FullReset);
    }
}
