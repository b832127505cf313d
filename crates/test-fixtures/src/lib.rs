//! Shared test doubles and fixture data for the Stride workspace.
//!
//! - [`ManualClock`]: time that only moves when a test says so.
//! - [`ScriptedApplier`]: a remote applier that replays scripted outcomes.
//! - [`InMemoryRemote`]: a paginated remote dataset with failure injection.
//! - [`FixtureMutation`]: a small closed mutation enum.
//!
//! JSON fixtures live under `data/` in this crate.

mod applier;
mod clock;
mod mutation;
mod remote;

pub use applier::{Outcome, ScriptedApplier};
pub use clock::ManualClock;
pub use mutation::FixtureMutation;
pub use remote::InMemoryRemote;

use std::path::PathBuf;

use serde::de::DeserializeOwned;

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Get the absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}
