use glob::Pattern;
use crate::{error::ConfigError, stage::Stage};

/// Restricts which stages this runner is willing to execute.
///
/// Every configured restriction must pass; an empty list places no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitConfig {
    /// Glob patterns over the repository slug (`octo/*`).
    pub repos: Vec<String>,
    /// Accepted trigger events.
    pub events: Vec<String>,
    /// Only run stages from trusted repositories.
    pub trusted: bool,
}

impl LimitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pattern in &self.repos {
            Pattern::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.msg.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn matches(&self, stage: &Stage) -> bool {
        if !self.repos.is_empty() && !self.repos.iter().any(|p| glob_match(p, &stage.repo.slug)) {
            return false;
        }
        if !self.events.is_empty() && !self.events.iter().any(|e| e == &stage.event) {
            return false;
        }
        if self.trusted && !stage.repo.trusted {
            return false;
        }
        true
    }
}

fn glob_match(pattern: &str, slug: &str) -> bool {
    Pattern::new(pattern)
        .map(|p| p.matches(slug))
        .unwrap_or(false)
}
