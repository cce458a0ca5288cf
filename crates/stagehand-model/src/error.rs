use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("remote server address is required")]
    MissingAddress,
    #[error("invalid remote server address: {0} (expected http:// or https://)")]
    InvalidAddress(String),
    #[error("runner name is required")]
    MissingRunnerName,
    #[error("invalid repository pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("invalid log format: {0} (expected text, json or journald)")]
    InvalidLogFormat(String),
}
