use std::{collections::HashMap, sync::Arc};

use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    error::CoreError,
    gate::{ConnectionGate, GateOutcome},
    status::StatusServer,
    worker::{TaskExit, WorkPoller},
};

const STATUS_TASK: &str = "status-server";
const POLLER_TASK: &str = "work-poller";

/// How the runner terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every task returned without error, or the caller asked us to stop.
    Clean,
    /// Single-shot mode finished its cycle and cancelled everything on purpose.
    ScheduledClean,
    /// A task failed; this is the first error observed.
    Failed(CoreError),
}

impl Outcome {
    #[inline]
    pub fn is_clean(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }

    pub fn into_result(self) -> Result<(), CoreError> {
        match self {
            Outcome::Clean | Outcome::ScheduledClean => Ok(()),
            Outcome::Failed(e) => Err(e),
        }
    }
}

/// What the fail-fast join produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    /// First error returned by any task.
    pub result: Result<(), CoreError>,
    /// Set when the poller reported [`TaskExit::Scheduled`].
    pub scheduled_exit: bool,
}

/// Map the joined result to an [`Outcome`].
///
/// A cancellation error is expected when the shutdown was ours (`scheduled`)
/// or the caller's (`requested`); anything else is a failure.
pub fn classify(joined: Result<(), CoreError>, scheduled: bool, requested: bool) -> Outcome {
    match joined {
        Ok(()) => Outcome::Clean,
        Err(e) if e.is_cancelled() && scheduled => Outcome::ScheduledClean,
        Err(e) if e.is_cancelled() && requested => Outcome::Clean,
        Err(e) => Outcome::Failed(e),
    }
}

/// Owns the shared cancellation signal and the runner's concurrent tasks.
///
/// `run` waits for connectivity, then starts the optional status server and
/// the work poller, joins them fail-fast and classifies the result.
pub struct LifecycleCoordinator {
    gate: ConnectionGate,
    worker: WorkPoller,
    status: Option<Arc<dyn StatusServer>>,
}

impl LifecycleCoordinator {
    pub fn new(gate: ConnectionGate, worker: WorkPoller) -> Self {
        Self {
            gate,
            worker,
            status: None,
        }
    }

    pub fn with_status_server(mut self, status: Option<Arc<dyn StatusServer>>) -> Self {
        self.status = status;
        self
    }

    /// Block until shutdown.
    ///
    /// The shared signal is a child of `parent`: cancelling `parent` stops everything,
    /// while the single-shot poller may cancel the shared signal without touching `parent`.
    pub async fn run(self, parent: &CancellationToken) -> Outcome {
        let shared = parent.child_token();

        if self.gate.wait(&shared).await == GateOutcome::Cancelled {
            info!("shutdown requested before the remote server was reachable");
            return Outcome::Clean;
        }

        let joined = self.join(&shared).await;
        debug!(scheduled_exit = joined.scheduled_exit, "all tasks finished");

        let outcome = classify(joined.result, joined.scheduled_exit, parent.is_cancelled());
        match &outcome {
            Outcome::ScheduledClean => info!("shutting down the server (scheduled)"),
            Outcome::Clean => info!("shutting down the server"),
            Outcome::Failed(e) => error!(error = %e, "shutting down the server"),
        }
        outcome
    }

    /// Start the tasks and wait for all of them.
    ///
    /// The first error cancels `shared` and is kept; later errors are discarded.
    /// `scheduled_exit` is read only after the poller's join handle resolved.
    pub(crate) async fn join(self, shared: &CancellationToken) -> Joined {
        let mut tasks = JoinSet::new();
        let mut names: HashMap<task::Id, &'static str> = HashMap::new();

        match self.status {
            Some(server) => {
                info!(addr = %server.addr(), "starting the status server");
                let ctx = shared.clone();
                let handle = tasks.spawn(async move {
                    server.serve(ctx).await.map(|()| TaskExit::Stopped)
                });
                names.insert(handle.id(), STATUS_TASK);
            }
            None => warn!("status server is disabled"),
        }

        let ctx = shared.clone();
        let worker = self.worker;
        let handle = tasks.spawn(async move { worker.run(ctx).await });
        names.insert(handle.id(), POLLER_TASK);

        let mut first_error: Option<CoreError> = None;
        let mut scheduled_exit = false;

        let name_of = |id: task::Id| names.get(&id).copied().unwrap_or("unnamed");

        while let Some(joined) = tasks.join_next_with_id().await {
            let (task, result) = match joined {
                Ok((id, result)) => (name_of(id), result),
                Err(e) => {
                    let task = name_of(e.id());
                    let reason = e.to_string();
                    (task, Err(CoreError::Aborted { task, reason }))
                }
            };

            match result {
                Ok(TaskExit::Scheduled) => {
                    debug!(task, "task requested a scheduled exit");
                    scheduled_exit = true;
                }
                Ok(TaskExit::Stopped) => debug!(task, "task stopped"),
                Err(e) => {
                    shared.cancel();
                    if first_error.is_none() {
                        debug!(task, error = %e, "task failed; cancelling the others");
                        first_error = Some(e);
                    } else {
                        debug!(task, error = %e, "discarding error from a later task");
                    }
                }
            }
        }

        Joined {
            result: first_error.map_or(Ok(()), Err),
            scheduled_exit,
        }
    }
}
