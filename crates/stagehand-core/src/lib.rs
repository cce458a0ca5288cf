//! Startup and lifecycle orchestration for the stagehand runner.
//!
//! The flow is strictly ordered:
//! 1. [`ConnectionGate`] blocks until the remote server answers a ping (or shutdown is requested).
//! 2. [`LifecycleCoordinator`] starts the optional [`StatusServer`] and the [`WorkPoller`] concurrently.
//! 3. Both are joined fail-fast and the result is classified into an [`Outcome`].
//!
//! Remote calls, stage execution and the status endpoint are collaborators
//! injected through the [`RemoteClient`], [`Poller`] and [`StatusServer`] traits.

mod error;
pub use error::CoreError;

mod client;
pub use client::RemoteClient;

mod poller;
pub use poller::Poller;

mod status;
pub use status::StatusServer;

mod gate;
pub use gate::{ConnectionGate, DEFAULT_RETRY_INTERVAL, GateOutcome};

mod worker;
pub use worker::{TaskExit, WorkPoller};

mod lifecycle;
pub use lifecycle::{Joined, LifecycleCoordinator, Outcome, classify};

pub mod history;
pub use history::History;
