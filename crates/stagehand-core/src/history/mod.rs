mod entry;
pub use entry::{StageEntry, StageState};

use std::{
    collections::VecDeque,
    sync::{Arc, PoisonError, RwLock},
    time::SystemTime,
};

use stagehand_model::{Stage, StageId};

/// Number of stages kept when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Bounded in-memory record of recently seen stages, newest first.
///
/// Cheap to clone; the poller writes to it and the status server reads it.
#[derive(Clone)]
pub struct History {
    inner: Arc<RwLock<VecDeque<StageEntry>>>,
    limit: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(VecDeque::with_capacity(limit))),
            limit: limit.max(1),
        }
    }

    /// Record a stage that is about to run.
    pub fn started(&self, stage: &Stage) {
        self.push(StageEntry::new(stage, StageState::Running));
    }

    /// Record a stage rejected by the runner's limits.
    pub fn skipped(&self, stage: &Stage) {
        self.push(StageEntry::new(stage, StageState::Skipped));
    }

    /// Mark a running stage as finished; `error` decides passed vs failed.
    pub fn finished(&self, id: StageId, error: Option<String>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = inner
            .iter_mut()
            .find(|e| e.id == id && e.state == StageState::Running)
        {
            entry.state = if error.is_some() {
                StageState::Failed
            } else {
                StageState::Passed
            };
            entry.updated_at = SystemTime::now();
            entry.error = error;
        }
    }

    /// Snapshot of all entries, newest first.
    pub fn entries(&self) -> Vec<StageEntry> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.iter().cloned().collect()
    }

    /// Number of entries per state, in [`StageState::ALL`] order.
    pub fn counts(&self) -> Vec<(StageState, usize)> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        StageState::ALL
            .iter()
            .map(|state| (*state, inner.iter().filter(|e| e.state == *state).count()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, entry: StageEntry) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.push_front(entry);
        inner.truncate(self.limit);
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_model::RepoRef;

    fn stage(id: StageId) -> Stage {
        Stage {
            id,
            name: format!("stage-{id}"),
            repo: RepoRef {
                slug: "octo/hello".to_string(),
                trusted: false,
            },
            event: "push".to_string(),
            steps: Vec::new(),
        }
    }

    #[test]
    fn started_then_finished_ok() {
        let history = History::new();
        history.started(&stage(1));
        history.finished(1, None);

        let entries = history.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].state, StageState::Passed);
        assert!(entries[0].error.is_none());
    }

    #[test]
    fn finished_with_error_is_failed() {
        let history = History::new();
        history.started(&stage(7));
        history.finished(7, Some("exit code: 2".into()));

        let entry = &history.entries()[0];
        assert_eq!(entry.state, StageState::Failed);
        assert_eq!(entry.error.as_deref(), Some("exit code: 2"));
    }

    #[test]
    fn finishing_unknown_stage_is_ignored() {
        let history = History::new();
        history.started(&stage(1));
        history.finished(99, None);
        assert_eq!(history.entries()[0].state, StageState::Running);
    }

    #[test]
    fn skipped_stage_is_terminal() {
        let history = History::new();
        history.skipped(&stage(3));
        let entry = &history.entries()[0];
        assert_eq!(entry.state, StageState::Skipped);
        assert!(entry.state.is_terminal());
    }

    #[test]
    fn newest_first_and_bounded() {
        let history = History::with_limit(2);
        history.started(&stage(1));
        history.started(&stage(2));
        history.started(&stage(3));

        let ids: Vec<_> = history.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn counts_per_state() {
        let history = History::new();
        history.started(&stage(1));
        history.started(&stage(2));
        history.finished(2, Some("boom".into()));
        history.skipped(&stage(3));

        let counts = history.counts();
        assert_eq!(
            counts,
            vec![
                (StageState::Running, 1),
                (StageState::Passed, 0),
                (StageState::Failed, 1),
                (StageState::Skipped, 1),
            ]
        );
    }

    #[test]
    fn entry_serializes_camel_case_and_skips_empty_error() {
        let history = History::new();
        history.started(&stage(5));
        let json = serde_json::to_string(&history.entries()[0]).unwrap();
        assert!(json.contains(r#""state":"running""#));
        assert!(json.contains("createdAt"));
        assert!(!json.contains("error"));
    }
}
