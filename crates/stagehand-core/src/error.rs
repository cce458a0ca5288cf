use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The shared cancellation signal fired while the operation was in flight.
    #[error("operation was cancelled")]
    Cancelled,
    #[error("remote call failed: {0}")]
    Remote(String),
    #[error("poll failed: {0}")]
    Poll(String),
    #[error("status server failed: {0}")]
    Serve(String),
    #[error("task {task} aborted: {reason}")]
    Aborted { task: &'static str, reason: String },
}

impl CoreError {
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }
}
