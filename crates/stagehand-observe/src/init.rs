use stagehand_model::LogFormat;
use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{config::LoggerConfig, error::LoggerError};

/// Install the global subscriber.
///
/// Succeeds once per process; later calls return [`LoggerError::AlreadyInitialized`].
pub fn init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = EnvFilter::try_new(&cfg.filter).map_err(|e| LoggerError::InvalidFilter {
        filter: cfg.filter.clone(),
        reason: e.to_string(),
    })?;
    if cfg.format == LogFormat::Journald && !cfg!(all(target_os = "linux", feature = "journald")) {
        return Err(LoggerError::JournaldUnavailable);
    }
    if tracing::dispatcher::has_been_set() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match cfg.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_ansi(cfg.ansi).with_timer(timer()))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_ansi(false).with_timer(timer()))
            .try_init(),
        LogFormat::Journald => return journald(registry),
    };
    installed.map_err(|e| LoggerError::Install(e.to_string()))
}

fn timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald<S>(registry: S) -> Result<(), LoggerError>
where
    S: tracing::Subscriber
        + for<'span> tracing_subscriber::registry::LookupSpan<'span>
        + Send
        + Sync
        + 'static,
{
    let layer = tracing_journald::layer()
        .map_err(|e| LoggerError::Install(format!("journald: {e}")))?
        .with_syslog_identifier("stagehand".to_string());
    registry
        .with(layer)
        .try_init()
        .map_err(|e| LoggerError::Install(e.to_string()))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald<S>(_registry: S) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldUnavailable)
}
