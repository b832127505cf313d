//! The dispatch loop.
//!
//! A single background task owns the [`Dispatcher`]: it is the only writer
//! of queue entry status and of the engine state. Everyone else talks to it
//! through a [`DispatcherHandle`] (commands in, state snapshots out).

mod command;
mod dispatcher;
mod handle;
mod task;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use handle::DispatcherHandle;
