use async_trait::async_trait;
use stagehand_model::{Filter, Stage};

use crate::error::RemoteError;

/// Hands out stages matching a capability filter.
#[async_trait]
pub trait StageSource: Send + Sync + 'static {
    /// `Ok(None)` means no work is available right now.
    async fn request(&self, filter: &Filter) -> Result<Option<Stage>, RemoteError>;
}
