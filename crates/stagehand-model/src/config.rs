use std::{collections::BTreeMap, fmt, net::SocketAddr, path::PathBuf, str::FromStr};

use crate::{error::ConfigError, limit::LimitConfig, mode::RunnerMode};

/// Complete runner configuration.
///
/// Built once at startup and treated as read-only afterwards;
/// components receive the group they need.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub client: ClientConfig,
    pub runner: RunnerConfig,
    pub limit: LimitConfig,
    pub secret: SecretConfig,
    pub server: ServerConfig,
    pub dashboard: DashboardConfig,
    pub platform: PlatformConfig,
    pub diagnostics: DiagnosticsConfig,
}

impl Config {
    /// Check the fields the runner cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let address = self.client.address.trim();
        if address.is_empty() {
            return Err(ConfigError::MissingAddress);
        }
        if !(address.starts_with("http://") || address.starts_with("https://")) {
            return Err(ConfigError::InvalidAddress(address.to_string()));
        }
        if self.runner.name.trim().is_empty() {
            return Err(ConfigError::MissingRunnerName);
        }
        self.limit.validate()
    }
}

/// How to reach the remote coordination server.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Base URL of the coordination server (e.g. `https://ci.example.com`).
    pub address: String,
    /// Shared secret sent with every request.
    pub secret: String,
    /// Accept invalid TLS certificates.
    pub skip_verify: bool,
    /// Log every request/response pair at debug level.
    pub dump: bool,
    /// Include bodies when dumping.
    pub dump_body: bool,
}

/// Runner identity and execution parameters.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Machine name reported to the remote server.
    pub name: String,
    /// Maximum number of stages executed concurrently.
    ///
    /// Zero selects single-shot mode, see [`RunnerMode::from_capacity`].
    pub capacity: usize,
    /// Extra environment variables exposed to every stage.
    pub environ: BTreeMap<String, String>,
    /// Directory under which per-stage workspaces are created.
    pub root: PathBuf,
    /// Symlinks (`link -> target`) created inside each workspace.
    pub symlinks: BTreeMap<String, String>,
    /// Labels advertised to the remote server for routing.
    pub labels: BTreeMap<String, String>,
}

impl RunnerConfig {
    #[inline]
    pub fn mode(&self) -> RunnerMode {
        RunnerMode::from_capacity(self.capacity)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            name: hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown-runner".to_string()),
            capacity: 2,
            environ: BTreeMap::new(),
            root: std::env::temp_dir().join("stagehand"),
            symlinks: BTreeMap::new(),
            labels: BTreeMap::new(),
        }
    }
}

/// External secret resolver used by the execution engine.
#[derive(Debug, Clone, Default)]
pub struct SecretConfig {
    /// Resolver URL; secrets are not resolved when unset.
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub skip_verify: bool,
}

impl SecretConfig {
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.endpoint.as_deref().is_some_and(|e| !e.trim().is_empty())
    }
}

/// Status server settings.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Listen address. `None` disables the status server entirely.
    pub addr: Option<SocketAddr>,
}

impl ServerConfig {
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.addr.is_some()
    }
}

/// Access control for the status dashboard.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Basic auth user; authentication is disabled when unset.
    pub username: Option<String>,
    pub password: Option<String>,
    pub realm: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            realm: "MyRealm".to_string(),
        }
    }
}

/// Platform attributes used to build the remote-side capability filter.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub os: String,
    pub arch: String,
    pub variant: String,
    pub kernel: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            variant: String::new(),
            kernel: String::new(),
        }
    }
}

/// Output format of the process log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
    Journald,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Journald => "journald",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "journald" | "journal" => Ok(LogFormat::Journald),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

/// Log verbosity and format.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticsConfig {
    pub debug: bool,
    pub trace: bool,
    pub format: LogFormat,
}

impl DiagnosticsConfig {
    /// Level for the runner's own crates; `trace` wins over `debug`.
    pub fn level(&self) -> &'static str {
        if self.trace {
            "trace"
        } else if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}
