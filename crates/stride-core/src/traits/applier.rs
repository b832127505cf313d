use async_trait::async_trait;

use crate::errors::ApplyError;
use crate::traits::Mutation;

/// Performs a mutation against the remote backend.
///
/// Delivery is at-least-once: the same entry can be applied again after a
/// crash between the remote success and the local `completed` mark. The
/// `idempotency_key` is the queue entry id and stays stable across retries, so
/// the backend can deduplicate on it.
#[async_trait]
pub trait RemoteApplier<M: Mutation>: Send + Sync {
    async fn apply(&self, idempotency_key: &str, mutation: &M) -> Result<(), ApplyError>;
}
