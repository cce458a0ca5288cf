use prometheus::{Encoder, IntGaugeVec, Opts, Registry, TextEncoder};
use stagehand_core::{History, history::StageState};

use crate::error::ApiError;

/// Prometheus view over the stage [`History`].
///
/// Gauges are refreshed from the history on every scrape.
///
/// ## Metrics
/// - `stagehand_stages{state}` - Gauge, stages currently recorded per state
pub struct StageMetrics {
    registry: Registry,
    stages: IntGaugeVec,
}

impl StageMetrics {
    pub fn new() -> Result<Self, ApiError> {
        let registry = Registry::new();
        let stages = IntGaugeVec::new(
            Opts::new("stagehand_stages", "Recent stages by state"),
            &["state"],
        )?;
        registry.register(Box::new(stages.clone()))?;
        Ok(Self { registry, stages })
    }

    /// Refresh from `history` and render the text exposition format.
    pub fn render(&self, history: &History) -> Result<(String, Vec<u8>), ApiError> {
        for state in StageState::ALL {
            self.stages.with_label_values(&[state.as_str()]).set(0);
        }
        for (state, count) in history.counts() {
            self.stages
                .with_label_values(&[state.as_str()])
                .set(count as i64);
        }

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok((encoder.format_type().to_string(), buffer))
    }
}
