use std::num::NonZeroUsize;

/// Polling mode, chosen once from the configured capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerMode {
    /// Poll indefinitely with up to `capacity` stages running at once.
    Continuous { capacity: NonZeroUsize },
    /// Run exactly one poll-and-execute cycle, then shut the process down.
    SingleShot,
}

impl RunnerMode {
    /// Capacity `0` selects [`RunnerMode::SingleShot`], anything else is continuous.
    pub fn from_capacity(capacity: usize) -> Self {
        match NonZeroUsize::new(capacity) {
            Some(capacity) => RunnerMode::Continuous { capacity },
            None => RunnerMode::SingleShot,
        }
    }

    /// Capacity argument handed to the poller (`0` for single-shot).
    #[inline]
    pub fn poll_capacity(&self) -> usize {
        match self {
            RunnerMode::Continuous { capacity } => capacity.get(),
            RunnerMode::SingleShot => 0,
        }
    }

    #[inline]
    pub fn is_single_shot(&self) -> bool {
        matches!(self, RunnerMode::SingleShot)
    }

    /// Short name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunnerMode::Continuous { .. } => "continuous",
            RunnerMode::SingleShot => "single-shot",
        }
    }
}
