use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use stagehand_core::{CoreError, History, StatusServer};
use stagehand_model::DashboardConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    error::ApiError,
    http::{ApiState, router},
    metrics::StageMetrics,
};

/// [`StatusServer`] serving the status routes with axum.
pub struct StatusApi {
    addr: SocketAddr,
    state: ApiState,
}

impl StatusApi {
    pub fn new(
        addr: SocketAddr,
        history: History,
        dashboard: DashboardConfig,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            addr,
            state: ApiState {
                history,
                metrics: Arc::new(StageMetrics::new()?),
                dashboard: Arc::new(dashboard),
            },
        })
    }
}

#[async_trait]
impl StatusServer for StatusApi {
    fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn serve(&self, ctx: CancellationToken) -> Result<(), CoreError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| CoreError::Serve(format!("bind {}: {e}", self.addr)))?;
        if let Ok(local) = listener.local_addr() {
            info!(addr = %local, "status server listening");
        }

        let shutdown = ctx.clone();
        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| CoreError::Serve(e.to_string()))?;

        debug!("status server stopped");
        Err(CoreError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn api(addr: SocketAddr) -> StatusApi {
        StatusApi::new(addr, History::new(), DashboardConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn serve_returns_cancelled_after_shutdown() {
        let ctx = CancellationToken::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let err = api(SocketAddr::from(([127, 0, 0, 1], 0)))
            .serve(ctx)
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::Cancelled);
    }

    #[tokio::test]
    async fn bind_failure_is_a_serve_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();

        let err = api(addr).serve(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::Serve(ref msg) if msg.starts_with("bind")));
    }
}
