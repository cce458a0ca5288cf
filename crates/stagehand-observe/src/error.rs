use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },
    #[error("journald output needs linux and the `journald` feature")]
    JournaldUnavailable,
    #[error("a global log subscriber is already installed")]
    AlreadyInitialized,
    #[error("failed to install the log subscriber: {0}")]
    Install(String),
}
