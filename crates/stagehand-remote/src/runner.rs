use async_trait::async_trait;
use stagehand_model::Stage;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    #[error("{0}")]
    Failed(String),
    #[error("cancelled")]
    Cancelled,
}

/// Execution engine for a single stage.
#[async_trait]
pub trait StageRunner: Send + Sync + 'static {
    /// Run `stage` to completion; `ctx` firing must abort the execution.
    async fn run(&self, ctx: CancellationToken, stage: &Stage) -> Result<(), RunnerError>;
}
