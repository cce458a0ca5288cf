use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::client::RemoteClient;

/// Pause between two failed pings.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Result of waiting for the remote server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// A ping succeeded.
    Connected,
    /// The shared signal fired first; the caller should shut down cleanly.
    Cancelled,
}

/// Blocks startup until the remote server answers a ping.
///
/// Retries forever at a fixed interval with no backoff growth, so a server that
/// is down when the runner starts is simply waited out.
pub struct ConnectionGate {
    client: Arc<dyn RemoteClient>,
    machine: String,
    interval: Duration,
}

impl ConnectionGate {
    pub fn new(client: Arc<dyn RemoteClient>, machine: impl Into<String>) -> Self {
        Self {
            client,
            machine: machine.into(),
            interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn wait(&self, ctx: &CancellationToken) -> GateOutcome {
        loop {
            if ctx.is_cancelled() {
                debug!("shutdown requested before the remote server was reached");
                return GateOutcome::Cancelled;
            }

            let result = self.client.ping(ctx, &self.machine).await;
            if ctx.is_cancelled() {
                debug!("shutdown requested while pinging the remote server");
                return GateOutcome::Cancelled;
            }

            match result {
                Ok(()) => {
                    info!(machine = %self.machine, "successfully pinged the remote server");
                    return GateOutcome::Connected;
                }
                Err(e) => {
                    error!(error = %e, retry_in = ?self.interval, "cannot ping the remote server");
                }
            }

            tokio::select! {
                _ = ctx.cancelled() => {
                    debug!("shutdown requested while waiting to retry ping");
                    return GateOutcome::Cancelled;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::error::CoreError;

    /// Fails the first `failures` pings, then succeeds.
    struct FlakyClient {
        failures: AtomicUsize,
        calls: Mutex<Vec<Instant>>,
    }

    impl FlakyClient {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                failures: AtomicUsize::new(failures),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteClient for FlakyClient {
        async fn ping(&self, _ctx: &CancellationToken, machine: &str) -> Result<(), CoreError> {
            assert_eq!(machine, "runner-1");
            self.calls.lock().unwrap().push(Instant::now());
            let left = self.failures.load(Ordering::SeqCst);
            if left == 0 {
                return Ok(());
            }
            self.failures.store(left - 1, Ordering::SeqCst);
            Err(CoreError::Remote("connection refused".into()))
        }
    }

    /// Succeeds, but cancels the shared signal while the ping is in flight.
    struct CancellingClient;

    #[async_trait]
    impl RemoteClient for CancellingClient {
        async fn ping(&self, ctx: &CancellationToken, _machine: &str) -> Result<(), CoreError> {
            ctx.cancel();
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn connects_immediately_when_server_is_up() {
        let client = FlakyClient::new(0);
        let gate = ConnectionGate::new(client.clone(), "runner-1");

        assert_eq!(gate.wait(&CancellationToken::new()).await, GateOutcome::Connected);
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_at_a_fixed_one_second_interval() {
        let client = FlakyClient::new(3);
        let gate = ConnectionGate::new(client.clone(), "runner-1");

        assert_eq!(gate.wait(&CancellationToken::new()).await, GateOutcome::Connected);

        let calls = client.calls();
        assert_eq!(calls.len(), 4);
        for pair in calls.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn custom_interval_is_used() {
        let client = FlakyClient::new(1);
        let gate = ConnectionGate::new(client.clone(), "runner-1")
            .with_interval(Duration::from_millis(250));

        assert_eq!(gate.wait(&CancellationToken::new()).await, GateOutcome::Connected);
        let calls = client.calls();
        assert_eq!(calls[1] - calls[0], Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_first_attempt() {
        let client = FlakyClient::new(0);
        let gate = ConnectionGate::new(client.clone(), "runner-1");
        let ctx = CancellationToken::new();
        ctx.cancel();

        assert_eq!(gate.wait(&ctx).await, GateOutcome::Cancelled);
        assert!(client.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_while_waiting_to_retry() {
        let client = FlakyClient::new(usize::MAX);
        let gate = ConnectionGate::new(client.clone(), "runner-1");
        let ctx = CancellationToken::new();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            canceller.cancel();
        });

        assert_eq!(gate.wait(&ctx).await, GateOutcome::Cancelled);
        // attempts at t=0s, 1s, 2s; the cancel at 2.5s interrupts the third sleep
        assert_eq!(client.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_ping_after_cancellation_is_not_connected() {
        let gate = ConnectionGate::new(Arc::new(CancellingClient), "runner-1");
        assert_eq!(gate.wait(&CancellationToken::new()).await, GateOutcome::Cancelled);
    }
}
