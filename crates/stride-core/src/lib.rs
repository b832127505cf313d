//! # stride-core
//!
//! Foundation crate for the Stride local-first sync engine.
//! Defines the data model, collaborator traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod tracing_setup;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::StrideConfig;
pub use errors::{StrideError, StrideResult};
pub use models::{EngineState, EntryStatus, QueueEntry, TableSyncConfig};
pub use traits::{Clock, Mutation, RemoteApplier, SystemClock};
