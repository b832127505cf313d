//! Data model shared by storage and the sync engine.

pub mod dataset;
pub mod engine_state;
pub mod gate;
pub mod progress;
pub mod queue_entry;
pub mod remote_row;
pub mod table_sync;

pub use dataset::{LocalDatasetMarker, RestoreMode, RestoreState};
pub use engine_state::{EngineState, EngineStatus, NetworkState};
pub use gate::{DrainReport, SwitchCheck};
pub use progress::{ReconcilePhase, ReconcileProgress, ReconcileReport, TableReport};
pub use queue_entry::{EntryStatus, QueueEntry, QueueStats};
pub use remote_row::{PageRequest, RemotePage, RemoteRow};
pub use table_sync::{TableCategory, TableSyncConfig};
