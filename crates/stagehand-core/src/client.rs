use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

/// Reachability check against the remote coordination server.
#[async_trait]
pub trait RemoteClient: Send + Sync + 'static {
    /// Ping the server on behalf of `machine`.
    async fn ping(&self, ctx: &CancellationToken, machine: &str) -> Result<(), CoreError>;
}
