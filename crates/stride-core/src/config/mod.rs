//! Configuration system for Stride.
//! TOML-based, layered: env > file > defaults.

pub mod breaker_config;
pub mod defaults;
pub mod dispatch_config;
pub mod queue_config;
pub mod reconcile_config;
pub mod storage_config;
pub mod stride_config;

pub use breaker_config::BreakerConfig;
pub use dispatch_config::DispatchConfig;
pub use queue_config::QueueConfig;
pub use reconcile_config::ReconcileConfig;
pub use storage_config::StorageConfig;
pub use stride_config::{validate_table_order, StrideConfig};
