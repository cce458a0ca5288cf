use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use stagehand_core::{CoreError, DEFAULT_RETRY_INTERVAL, History, Poller};
use stagehand_model::{Filter, LimitConfig, StageId};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::{
    error::RemoteError,
    runner::{RunnerError, StageRunner},
    source::StageSource,
};

/// What one request/execute cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// No stage was available.
    Idle,
    /// A stage was handed out but rejected by the runner limits.
    Skipped(StageId),
    /// A stage ran to completion.
    Ran(StageId),
}

/// [`Poller`] backed by a [`StageSource`] and a [`StageRunner`].
///
/// Continuous mode runs one worker per unit of capacity, so at most `capacity`
/// stages execute at once.
#[derive(Clone)]
pub struct RemotePoller {
    source: Arc<dyn StageSource>,
    runner: Arc<dyn StageRunner>,
    filter: Filter,
    limits: LimitConfig,
    history: History,
    retry: Duration,
}

impl RemotePoller {
    pub fn new(source: Arc<dyn StageSource>, runner: Arc<dyn StageRunner>, filter: Filter) -> Self {
        Self {
            source,
            runner,
            filter,
            limits: LimitConfig::default(),
            history: History::new(),
            retry: DEFAULT_RETRY_INTERVAL,
        }
    }

    pub fn with_limits(mut self, limits: LimitConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    /// Pause after an idle poll or a transient error.
    pub fn with_retry(mut self, retry: Duration) -> Self {
        self.retry = retry;
        self
    }

    #[inline]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Request one stage and, if it passes the limits, run it.
    pub async fn poll_once(
        &self,
        ctx: &CancellationToken,
        worker: usize,
    ) -> Result<Cycle, RemoteError> {
        let requested = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(RemoteError::Cancelled),
            res = self.source.request(&self.filter) => res?,
        };
        let Some(stage) = requested else {
            trace!(worker, "no stage available");
            return Ok(Cycle::Idle);
        };

        if !self.limits.matches(&stage) {
            info!(
                worker,
                stage = stage.id,
                repo = %stage.repo.slug,
                event = %stage.event,
                "stage rejected by runner limits"
            );
            self.history.skipped(&stage);
            return Ok(Cycle::Skipped(stage.id));
        }

        info!(worker, stage = stage.id, repo = %stage.repo.slug, name = %stage.name, "running stage");
        self.history.started(&stage);

        match self.runner.run(ctx.clone(), &stage).await {
            Ok(()) => {
                debug!(worker, stage = stage.id, "stage passed");
                self.history.finished(stage.id, None);
                Ok(Cycle::Ran(stage.id))
            }
            Err(e) => {
                let reason = e.to_string();
                self.history.finished(stage.id, Some(reason.clone()));
                if e == RunnerError::Cancelled {
                    return Err(RemoteError::Cancelled);
                }
                Err(RemoteError::Stage {
                    id: stage.id,
                    reason,
                })
            }
        }
    }

    async fn work(self, ctx: CancellationToken, worker: usize) -> Result<(), RemoteError> {
        debug!(worker, "poller worker started");

        while !ctx.is_cancelled() {
            let pause = match self.poll_once(&ctx, worker).await {
                Ok(Cycle::Idle) => true,
                Ok(_) => false,
                Err(RemoteError::Cancelled) => break,
                Err(e) if e.is_fatal() => {
                    error!(worker, error = %e, "unrecoverable poll error");
                    return Err(e);
                }
                Err(e) => {
                    warn!(worker, error = %e, "poll failed");
                    e.is_transient()
                }
            };

            if pause {
                tokio::select! {
                    _ = ctx.cancelled() => break,
                    _ = tokio::time::sleep(self.retry) => {}
                }
            }
        }

        debug!(worker, "poller worker stopped");
        Ok(())
    }

    async fn poll_continuous(
        &self,
        ctx: CancellationToken,
        capacity: usize,
    ) -> Result<(), RemoteError> {
        let workers = ctx.child_token();
        let mut set = JoinSet::new();
        for worker in 1..=capacity {
            set.spawn(self.clone().work(workers.clone(), worker));
        }

        let mut first_error = None;
        while let Some(joined) = set.join_next().await {
            let result = joined
                .map_err(|e| RemoteError::Worker(e.to_string()))
                .and_then(|r| r);
            if let Err(e) = result {
                workers.cancel();
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Poller for RemotePoller {
    async fn poll(&self, ctx: CancellationToken, capacity: usize) -> Result<(), CoreError> {
        if capacity == 0 {
            let cycle = self.poll_once(&ctx, 0).await?;
            debug!(?cycle, "single-shot cycle finished");
            return Ok(());
        }
        self.poll_continuous(ctx, capacity).await?;
        Ok(())
    }
}
