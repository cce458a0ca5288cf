use std::net::SocketAddr;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

/// Optional operational endpoint served alongside the poller.
#[async_trait]
pub trait StatusServer: Send + Sync + 'static {
    fn addr(&self) -> SocketAddr;

    /// Serve until `ctx` fires, then return [`CoreError::Cancelled`].
    /// Any other error is a transport failure.
    async fn serve(&self, ctx: CancellationToken) -> Result<(), CoreError>;
}
