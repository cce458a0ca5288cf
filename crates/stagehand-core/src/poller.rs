use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

/// Fetches work from the remote server and executes it.
#[async_trait]
pub trait Poller: Send + Sync + 'static {
    /// With `capacity >= 1`, keep `capacity` stages in flight until `ctx` is cancelled
    /// or an unrecoverable error occurs.
    /// With `capacity == 0`, run one poll-and-execute cycle and return.
    async fn poll(&self, ctx: CancellationToken, capacity: usize) -> Result<(), CoreError>;
}
