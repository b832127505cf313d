//! Network transports for the remote read side.

#[cfg(feature = "http")]
mod http_remote;

#[cfg(feature = "http")]
pub use http_remote::{HttpRemoteConfig, HttpRemoteSource};
