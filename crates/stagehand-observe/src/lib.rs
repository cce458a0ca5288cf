//! Process log for the stagehand runner.
//!
//! [`init`] installs the global `tracing` subscriber described by the runner's
//! [`DiagnosticsConfig`](stagehand_model::DiagnosticsConfig). Components never touch
//! the subscriber; they log through `tracing` macros.

mod config;
pub use config::{LoggerConfig, RUNNER_TARGET};

mod error;
pub use error::LoggerError;

mod init;
pub use init::init;
