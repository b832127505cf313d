//! Login-time reconciliation: decide between a full reset and an
//! incremental pull, then install remote rows table by table.

mod decision;
mod service;

pub use decision::{decide, Decision, DecisionReason};
pub use service::ReconciliationService;
