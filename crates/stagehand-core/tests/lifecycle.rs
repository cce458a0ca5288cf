use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use stagehand_core::{
    ConnectionGate, CoreError, LifecycleCoordinator, Outcome, Poller, RemoteClient, StatusServer,
    WorkPoller,
};
use stagehand_model::RunnerMode;

/// Ping fails `failures` times, then succeeds.
struct Remote {
    failures: AtomicUsize,
    pings: Mutex<Vec<Instant>>,
}

impl Remote {
    fn up() -> Arc<Self> {
        Self::failing(0)
    }

    fn failing(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            failures: AtomicUsize::new(failures),
            pings: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl RemoteClient for Remote {
    async fn ping(&self, _ctx: &CancellationToken, _machine: &str) -> Result<(), CoreError> {
        self.pings.lock().unwrap().push(Instant::now());
        let left = self.failures.load(Ordering::SeqCst);
        if left == 0 {
            return Ok(());
        }
        self.failures.store(left.saturating_sub(1), Ordering::SeqCst);
        Err(CoreError::Remote("connection refused".into()))
    }
}

enum PollBehavior {
    /// Return immediately with this result.
    Return(Result<(), CoreError>),
    /// Block until cancelled, then return `Ok`.
    UntilCancelled,
    /// Wait, then fail.
    FailAfter(Duration, CoreError),
    Panic,
}

struct FakePoller {
    behavior: PollBehavior,
    calls: Mutex<Vec<usize>>,
}

impl FakePoller {
    fn new(behavior: PollBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Poller for FakePoller {
    async fn poll(&self, ctx: CancellationToken, capacity: usize) -> Result<(), CoreError> {
        self.calls.lock().unwrap().push(capacity);
        match &self.behavior {
            PollBehavior::Return(result) => result.clone(),
            PollBehavior::UntilCancelled => {
                ctx.cancelled().await;
                Ok(())
            }
            PollBehavior::FailAfter(delay, err) => {
                tokio::time::sleep(*delay).await;
                Err(err.clone())
            }
            PollBehavior::Panic => panic!("poller exploded"),
        }
    }
}

enum ServeBehavior {
    /// Serve until cancelled, then report the cancellation condition.
    UntilCancelled,
    /// Fail immediately.
    Fail(CoreError),
}

struct FakeServer {
    behavior: ServeBehavior,
    started: AtomicBool,
    saw_cancel: AtomicBool,
}

impl FakeServer {
    fn new(behavior: ServeBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            started: AtomicBool::new(false),
            saw_cancel: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl StatusServer for FakeServer {
    fn addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 3000))
    }

    async fn serve(&self, ctx: CancellationToken) -> Result<(), CoreError> {
        self.started.store(true, Ordering::SeqCst);
        match &self.behavior {
            ServeBehavior::UntilCancelled => {
                ctx.cancelled().await;
                self.saw_cancel.store(true, Ordering::SeqCst);
                Err(CoreError::Cancelled)
            }
            ServeBehavior::Fail(err) => Err(err.clone()),
        }
    }
}

fn coordinator(
    remote: Arc<Remote>,
    poller: Arc<FakePoller>,
    capacity: usize,
    server: Option<Arc<FakeServer>>,
) -> LifecycleCoordinator {
    let gate = ConnectionGate::new(remote, "runner-1");
    let worker = WorkPoller::new(poller, RunnerMode::from_capacity(capacity));
    let server = server.map(|s| s as Arc<dyn StatusServer>);
    LifecycleCoordinator::new(gate, worker).with_status_server(server)
}

#[tokio::test(start_paused = true)]
async fn parent_cancel_during_connectivity_wait_is_clean_and_starts_nothing() {
    let remote = Remote::failing(usize::MAX);
    let poller = FakePoller::new(PollBehavior::UntilCancelled);
    let server = FakeServer::new(ServeBehavior::UntilCancelled);
    let parent = CancellationToken::new();

    let canceller = parent.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        canceller.cancel();
    });

    let outcome = coordinator(remote.clone(), poller.clone(), 2, Some(server.clone()))
        .run(&parent)
        .await;

    assert_eq!(outcome, Outcome::Clean);
    assert!(outcome.into_result().is_ok());
    assert!(poller.calls().is_empty());
    assert!(!server.started.load(Ordering::SeqCst));
    assert_eq!(remote.pings.lock().unwrap().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn tasks_start_only_after_connectivity_is_confirmed() {
    let remote = Remote::failing(2);
    let poller = FakePoller::new(PollBehavior::Return(Ok(())));
    let started_at = Instant::now();

    let outcome = coordinator(remote.clone(), poller.clone(), 0, None)
        .run(&CancellationToken::new())
        .await;

    assert_eq!(outcome, Outcome::Clean);
    let pings = remote.pings.lock().unwrap().clone();
    assert_eq!(pings.len(), 3);
    assert_eq!(pings[1] - pings[0], Duration::from_secs(1));
    assert_eq!(pings[2] - pings[1], Duration::from_secs(1));
    assert_eq!(pings[2] - started_at, Duration::from_secs(2));
    assert_eq!(poller.calls(), vec![0]);
}

#[tokio::test]
async fn single_shot_success_without_server_is_clean() {
    let poller = FakePoller::new(PollBehavior::Return(Ok(())));
    let parent = CancellationToken::new();

    let outcome = coordinator(Remote::up(), poller.clone(), 0, None)
        .run(&parent)
        .await;

    assert_eq!(outcome, Outcome::Clean);
    assert_eq!(poller.calls(), vec![0]);
    assert!(!parent.is_cancelled());
}

#[tokio::test]
async fn single_shot_poll_error_is_logged_not_propagated() {
    let poller = FakePoller::new(PollBehavior::Return(Err(CoreError::Poll(
        "stage request failed".into(),
    ))));

    let outcome = coordinator(Remote::up(), poller.clone(), 0, None)
        .run(&CancellationToken::new())
        .await;

    assert_eq!(outcome.into_result(), Ok(()));
    assert_eq!(poller.calls(), vec![0]);
}

#[tokio::test]
async fn single_shot_with_server_is_scheduled_clean() {
    let poller = FakePoller::new(PollBehavior::Return(Ok(())));
    let server = FakeServer::new(ServeBehavior::UntilCancelled);

    let outcome = coordinator(Remote::up(), poller, 0, Some(server.clone()))
        .run(&CancellationToken::new())
        .await;

    assert_eq!(outcome, Outcome::ScheduledClean);
    assert!(server.saw_cancel.load(Ordering::SeqCst));
    assert!(outcome.into_result().is_ok());
}

#[tokio::test]
async fn single_shot_failure_with_server_surfaces_the_cancellation() {
    let poller = FakePoller::new(PollBehavior::Return(Err(CoreError::Poll("boom".into()))));
    let server = FakeServer::new(ServeBehavior::UntilCancelled);

    let outcome = coordinator(Remote::up(), poller, 0, Some(server))
        .run(&CancellationToken::new())
        .await;

    assert_eq!(outcome, Outcome::Failed(CoreError::Cancelled));
}

#[tokio::test]
async fn continuous_poll_error_fails_and_cancels_server() {
    let err = CoreError::Poll("unauthorized".into());
    let poller = FakePoller::new(PollBehavior::FailAfter(
        Duration::from_millis(10),
        err.clone(),
    ));
    let server = FakeServer::new(ServeBehavior::UntilCancelled);

    let outcome = coordinator(Remote::up(), poller.clone(), 3, Some(server.clone()))
        .run(&CancellationToken::new())
        .await;

    assert_eq!(outcome, Outcome::Failed(err));
    assert!(server.saw_cancel.load(Ordering::SeqCst));
    assert_eq!(poller.calls(), vec![3]);
}

#[tokio::test]
async fn server_failure_cancels_continuous_poller() {
    let err = CoreError::Serve("address already in use".into());
    let poller = FakePoller::new(PollBehavior::UntilCancelled);
    let server = FakeServer::new(ServeBehavior::Fail(err.clone()));

    let outcome = coordinator(Remote::up(), poller, 1, Some(server))
        .run(&CancellationToken::new())
        .await;

    assert_eq!(outcome, Outcome::Failed(err));
}

#[tokio::test]
async fn parent_cancel_in_continuous_mode_is_clean() {
    let poller = FakePoller::new(PollBehavior::UntilCancelled);
    let server = FakeServer::new(ServeBehavior::UntilCancelled);
    let parent = CancellationToken::new();

    let canceller = parent.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let outcome = coordinator(Remote::up(), poller, 2, Some(server.clone()))
        .run(&parent)
        .await;

    assert_eq!(outcome, Outcome::Clean);
    assert!(server.saw_cancel.load(Ordering::SeqCst));
}

#[tokio::test]
async fn racing_failure_and_single_shot_cancel_keep_first_error() {
    // The server fails at once, which cancels the shared signal; the single-shot
    // poller then finishes and cancels it a second time.
    let err = CoreError::Serve("listener closed".into());
    let poller = FakePoller::new(PollBehavior::UntilCancelled);
    let server = FakeServer::new(ServeBehavior::Fail(err.clone()));

    let outcome = coordinator(Remote::up(), poller.clone(), 0, Some(server))
        .run(&CancellationToken::new())
        .await;

    assert_eq!(outcome, Outcome::Failed(err));
    assert_eq!(poller.calls(), vec![0]);
}

#[tokio::test]
async fn panicking_poller_is_reported_as_aborted() {
    let poller = FakePoller::new(PollBehavior::Panic);
    let server = FakeServer::new(ServeBehavior::UntilCancelled);

    let outcome = coordinator(Remote::up(), poller, 1, Some(server.clone()))
        .run(&CancellationToken::new())
        .await;

    assert!(matches!(
        outcome,
        Outcome::Failed(CoreError::Aborted { task: "work-poller", .. })
    ));
    assert!(server.saw_cancel.load(Ordering::SeqCst));
}
