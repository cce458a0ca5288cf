use stagehand_remote::RunnerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to prepare workspace {path}: {reason}")]
    Workspace { path: String, reason: String },
    #[error("step {step}: spawn failed: {reason}")]
    Spawn { step: String, reason: String },
    #[error("step {step}: exit code: {code}")]
    NonZeroExit { step: String, code: i32 },
    #[error("step {step}: terminated by signal")]
    KilledBySignal { step: String },
    #[error("secret {name}: {reason}")]
    Secret { name: String, reason: String },
    #[error("secret resolver: {0}")]
    SecretResolver(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("cancelled")]
    Cancelled,
}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Io(e.to_string())
    }
}

impl From<ExecError> for RunnerError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::Cancelled => RunnerError::Cancelled,
            other => RunnerError::Failed(other.to_string()),
        }
    }
}
