//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::defaults::DEFAULT_LOG_FILTER;

static INIT: Once = Once::new();

/// Initialize the Stride tracing/logging system.
///
/// Reads the `STRIDE_LOG` environment variable for per-module levels, e.g.
/// `STRIDE_LOG=stride_sync=debug,stride_storage=warn`.
/// Falls back to `stride=info` if unset or invalid.
///
/// Idempotent; later calls are no-ops, as is a call made after the host
/// installed its own global subscriber.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(env_filter())
            .try_init();
    });
}

/// Same as [`init_tracing`] but emits JSON lines, for log shipping from devices.
pub fn init_tracing_json() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true))
            .with(env_filter())
            .try_init();
    });
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("STRIDE_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}
