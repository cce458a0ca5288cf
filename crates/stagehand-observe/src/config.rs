use std::io::IsTerminal;

use stagehand_model::{DiagnosticsConfig, LogFormat};

/// Target prefix shared by every runner crate (`stagehand_core`, `stagehand::exec`, ...).
pub const RUNNER_TARGET: &str = "stagehand";

/// Resolved subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive.
    pub filter: String,
    pub ansi: bool,
}

impl From<&DiagnosticsConfig> for LoggerConfig {
    /// `--debug`/`--trace` raise only the runner's own targets; HTTP and runtime
    /// crates stay at `info`.
    fn from(cfg: &DiagnosticsConfig) -> Self {
        let filter = match cfg.level() {
            "info" => "info".to_string(),
            level => format!("info,{RUNNER_TARGET}={level}"),
        };
        Self {
            format: cfg.format,
            filter,
            ansi: cfg.format == LogFormat::Text && std::io::stdout().is_terminal(),
        }
    }
}
