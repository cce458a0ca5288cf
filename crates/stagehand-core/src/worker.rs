use std::sync::Arc;

use stagehand_model::RunnerMode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{error::CoreError, poller::Poller};

/// How a concurrent task finished without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskExit {
    /// Ran until the shared signal fired or its work ran out.
    Stopped,
    /// Single-shot cycle completed and the task cancelled the shared signal itself.
    Scheduled,
}

/// Drives the [`Poller`] in the mode selected at construction.
pub struct WorkPoller {
    poller: Arc<dyn Poller>,
    mode: RunnerMode,
}

impl WorkPoller {
    pub fn new(poller: Arc<dyn Poller>, mode: RunnerMode) -> Self {
        Self { poller, mode }
    }

    #[inline]
    pub fn mode(&self) -> RunnerMode {
        self.mode
    }

    /// Run until done.
    ///
    /// Continuous mode propagates the poller's error. Single-shot mode never fails:
    /// a poll error is logged and swallowed, and the shared signal is cancelled
    /// either way so sibling tasks unwind.
    pub async fn run(self, ctx: CancellationToken) -> Result<TaskExit, CoreError> {
        info!(
            mode = self.mode.as_str(),
            capacity = self.mode.poll_capacity(),
            "polling the remote server"
        );

        match self.mode {
            RunnerMode::Continuous { capacity } => {
                self.poller.poll(ctx, capacity.get()).await?;
                Ok(TaskExit::Stopped)
            }
            RunnerMode::SingleShot => Ok(self.run_single_shot(ctx).await),
        }
    }

    async fn run_single_shot(&self, ctx: CancellationToken) -> TaskExit {
        let exit = match self.poller.poll(ctx.clone(), 0).await {
            Ok(()) => TaskExit::Scheduled,
            Err(e) if ctx.is_cancelled() => {
                debug!(error = %e, "single-shot poll stopped by shutdown");
                TaskExit::Stopped
            }
            Err(e) => {
                error!(error = %e, "single-shot poll failed");
                TaskExit::Stopped
            }
        };
        ctx.cancel();
        exit
    }
}
