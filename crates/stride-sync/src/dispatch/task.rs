use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;

use stride_core::traits::Mutation;

use super::command::Command;
use super::dispatcher::{DispatchOutcome, Dispatcher};
use super::handle::DispatcherHandle;

const COMMAND_BUFFER: usize = 64;

enum Flow {
    Continue,
    Exit,
}

impl<M: Mutation> Dispatcher<M> {
    /// Move the dispatcher onto a background task. Must be called inside a
    /// tokio runtime.
    pub fn spawn(self) -> (DispatcherHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let handle = DispatcherHandle::new(tx, self.subscribe());
        let join = tokio::spawn(run(self, rx));
        (handle, join)
    }

    async fn handle_command(&mut self, command: Command, paused: &mut bool) -> Flow {
        match command {
            Command::Wake => {}
            Command::NetworkChanged(network) => {
                if let Err(e) = self.set_network_state(network) {
                    tracing::error!(error = %e, "failed to record network change");
                }
            }
            Command::Pause(ack) => {
                *paused = true;
                tracing::debug!("dispatcher paused");
                let _ = ack.send(());
            }
            Command::Resume => {
                *paused = false;
                tracing::debug!("dispatcher resumed");
            }
            Command::Drain {
                user_id,
                deadline,
                reply,
            } => {
                let result = self.drain_user(&user_id, deadline).await;
                let _ = reply.send(result);
            }
            Command::Shutdown => return Flow::Exit,
        }
        Flow::Continue
    }
}

async fn run<M: Mutation>(mut dispatcher: Dispatcher<M>, mut rx: mpsc::Receiver<Command>) {
    tracing::info!("dispatcher started");
    let mut paused = false;

    'outer: loop {
        let mut wait: Option<Duration> = None;

        if !paused {
            match dispatcher.dispatch_next().await {
                Ok(outcome) if outcome.made_progress() => {
                    // Commands queued during the attempt run before the next one.
                    loop {
                        match rx.try_recv() {
                            Ok(command) => {
                                if let Flow::Exit = dispatcher.handle_command(command, &mut paused).await {
                                    break 'outer;
                                }
                            }
                            Err(TryRecvError::Empty) => break,
                            Err(TryRecvError::Disconnected) => break 'outer,
                        }
                    }
                    continue;
                }
                Ok(DispatchOutcome::Suspended { until }) => wait = Some(dispatcher.wait_for(until)),
                Ok(DispatchOutcome::Idle { next_due }) => wait = Some(dispatcher.wait_for(next_due)),
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "dispatch step failed");
                    wait = Some(dispatcher.wait_for(None));
                }
            }
        }

        let sleep = tokio::time::sleep(wait.unwrap_or(Duration::ZERO));
        tokio::pin!(sleep);
        tokio::select! {
            command = rx.recv() => match command {
                Some(command) => {
                    if let Flow::Exit = dispatcher.handle_command(command, &mut paused).await {
                        break;
                    }
                }
                None => break,
            },
            _ = &mut sleep, if wait.is_some() => {}
        }
    }

    tracing::info!("dispatcher stopped");
}
