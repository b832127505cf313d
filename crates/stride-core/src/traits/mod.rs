//! Seams between the sync core and its collaborators.

pub mod applier;
pub mod clock;
pub mod local_store;
pub mod mutation;
pub mod progress;
pub mod remote_source;

pub use applier::RemoteApplier;
pub use clock::{Clock, SystemClock};
pub use local_store::LocalTableStore;
pub use mutation::{decode_mutation, encode_mutation, DecodeError, EncodedMutation, Mutation};
pub use progress::{NoopProgress, ProgressSink};
pub use remote_source::RemoteSource;
