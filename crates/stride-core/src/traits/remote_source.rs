use async_trait::async_trait;

use crate::errors::RemoteError;
use crate::models::{PageRequest, RemotePage};

/// Read side of the backend used by reconciliation.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<RemotePage, RemoteError>;
}
