//! Client side of the remote coordination server.
//!
//! [`HttpClient`] speaks the ping/stage RPCs, [`RemotePoller`] turns stage requests
//! into executions through an injected [`StageRunner`].

mod error;
pub use error::RemoteError;

mod client;
pub use client::HttpClient;

mod source;
pub use source::StageSource;

mod runner;
pub use runner::{RunnerError, StageRunner};

mod secret;
pub use secret::{ExternalSecrets, SecretProvider};

mod poller;
pub use poller::{Cycle, RemotePoller};
