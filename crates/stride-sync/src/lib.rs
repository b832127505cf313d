//! # stride-sync
//!
//! The synchronization engine: a durable mutation queue drained by a single
//! background dispatcher with per-entry backoff, a circuit breaker over
//! engine health, a queue gate that protects unsynced data across user
//! switches, and login-time reconciliation of the local dataset.
//!
//! [`SyncEngine`] ties the pieces together. The individual components are
//! public so they can be driven directly in tests.

pub mod backoff;
pub mod breaker;
pub mod dispatch;
pub mod engine;
pub mod gate;
pub mod queue;
pub mod reconcile;
pub mod transport;

mod time;

pub use dispatch::{DispatchOutcome, Dispatcher, DispatcherHandle};
pub use engine::{EnginePhase, LoginOptions, SyncEngine, SyncEngineBuilder};
pub use gate::QueueGate;
pub use queue::MutationQueue;
pub use reconcile::{decide, Decision, DecisionReason, ReconciliationService};
