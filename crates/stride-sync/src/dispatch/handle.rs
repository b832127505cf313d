use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use stride_core::errors::GateError;
use stride_core::models::{DrainReport, EngineState, NetworkState};

use super::command::Command;

/// Cheap, cloneable front door to the dispatcher task.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    tx: mpsc::Sender<Command>,
    state_rx: watch::Receiver<EngineState>,
}

impl DispatcherHandle {
    pub(crate) fn new(tx: mpsc::Sender<Command>, state_rx: watch::Receiver<EngineState>) -> Self {
        Self { tx, state_rx }
    }

    /// Ask the task to look at the queue. Never blocks; a full command
    /// buffer already guarantees the task will run again.
    pub fn wake(&self) {
        match self.tx.try_send(Command::Wake) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Closed(_)) => tracing::debug!("wake ignored, dispatcher stopped"),
        }
    }

    pub async fn set_network_state(&self, network: NetworkState) -> Result<(), GateError> {
        self.send(Command::NetworkChanged(network)).await
    }

    /// Stop dispatching. Returns once no mutation is in flight.
    pub async fn pause(&self) -> Result<(), GateError> {
        let (ack, done) = oneshot::channel();
        self.send(Command::Pause(ack)).await?;
        done.await.map_err(|_| GateError::DispatcherUnavailable)
    }

    pub async fn resume(&self) -> Result<(), GateError> {
        self.send(Command::Resume).await
    }

    /// Final attempt for every unsynced entry of `user_id`, bounded by `timeout`.
    pub async fn drain(&self, user_id: &str, timeout: Duration) -> Result<DrainReport, GateError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Drain {
            user_id: user_id.to_string(),
            deadline: Instant::now() + timeout,
            reply,
        })
        .await?;
        let report = response
            .await
            .map_err(|_| GateError::DispatcherUnavailable)??;
        Ok(report)
    }

    pub async fn shutdown(&self) {
        // Already stopped is fine.
        let _ = self.tx.send(Command::Shutdown).await;
    }

    /// Latest published engine state.
    pub fn engine_state(&self) -> EngineState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state_rx.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    async fn send(&self, command: Command) -> Result<(), GateError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| GateError::DispatcherUnavailable)
    }
}
