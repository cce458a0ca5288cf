use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier assigned to a stage by the remote server.
pub type StageId = i64;

/// A unit of work handed out by the remote server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    pub repo: RepoRef,
    /// Triggering event (`push`, `pull_request`, `tag`, ...).
    pub event: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Repository the stage belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoRef {
    /// `owner/name`.
    pub slug: String,
    #[serde(default)]
    pub trusted: bool,
}

/// One step of a stage: a named list of shell commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub name: String,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environ: BTreeMap<String, String>,
    /// Secret names resolved before the step runs; each is exposed as an
    /// upper-cased environment variable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<String>,
}
