//! Query modules, one per table. Every function takes a borrowed
//! `Connection` so callers choose whether it runs inside a transaction.

pub mod dataset_ops;
pub mod engine_state_ops;
pub mod queue_ops;
pub mod row_ops;
