use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use stagehand_model::{Stage, StageId};

/// Where a stage is in its life on this runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageState {
    /// Accepted and executing.
    Running,
    /// Finished successfully.
    Passed,
    /// Finished with an error.
    Failed,
    /// Rejected by the configured limits and never run.
    Skipped,
}

impl StageState {
    pub const ALL: [StageState; 4] = [
        StageState::Running,
        StageState::Passed,
        StageState::Failed,
        StageState::Skipped,
    ];

    pub fn is_terminal(&self) -> bool {
        !matches!(self, StageState::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageState::Running => "running",
            StageState::Passed => "passed",
            StageState::Failed => "failed",
            StageState::Skipped => "skipped",
        }
    }
}

/// One row of the stage history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageEntry {
    pub id: StageId,
    pub name: String,
    pub repo: String,
    pub event: String,
    pub state: StageState,
    #[serde(with = "time_serde")]
    pub created_at: SystemTime,
    #[serde(with = "time_serde")]
    pub updated_at: SystemTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageEntry {
    pub(crate) fn new(stage: &Stage, state: StageState) -> Self {
        let now = SystemTime::now();
        Self {
            id: stage.id,
            name: stage.name.clone(),
            repo: stage.repo.slug.clone(),
            event: stage.event.clone(),
            state,
            created_at: now,
            updated_at: now,
            error: None,
        }
    }
}

mod time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let since_epoch = time
            .duration_since(UNIX_EPOCH)
            .map_err(serde::ser::Error::custom)?;
        since_epoch.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + std::time::Duration::from_secs(secs))
    }
}
