use tokio::sync::oneshot;
use tokio::time::Instant;

use stride_core::errors::StorageError;
use stride_core::models::{DrainReport, NetworkState};

/// Everything the dispatcher task can be asked to do. Commands are handled
/// strictly between two dispatch attempts, never during an applier call.
#[derive(Debug)]
pub(crate) enum Command {
    /// Something new may be due; re-check the queue now.
    Wake,
    NetworkChanged(NetworkState),
    /// Stop dispatching. Acknowledged once no mutation is in flight.
    Pause(oneshot::Sender<()>),
    Resume,
    /// One final attempt for each unsynced entry of `user_id`.
    Drain {
        user_id: String,
        deadline: Instant,
        reply: oneshot::Sender<Result<DrainReport, StorageError>>,
    },
    Shutdown,
}
