use std::{collections::BTreeMap, net::SocketAddr, path::PathBuf};

use clap::Parser;
use stagehand_model::{
    ClientConfig, Config, DashboardConfig, DiagnosticsConfig, LimitConfig, LogFormat,
    PlatformConfig, RunnerConfig, SecretConfig, ServerConfig,
};

/// Runner agent: polls a coordination server for stages and runs them on this host.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Coordination server base URL
    #[arg(long, env = "STAGEHAND_RPC_ADDRESS")]
    pub address: String,

    /// Shared secret sent with every request
    #[arg(long, env = "STAGEHAND_RPC_SECRET", default_value = "", hide_env_values = true)]
    pub secret: String,

    /// Accept invalid TLS certificates from the coordination server
    #[arg(long, env = "STAGEHAND_RPC_SKIP_VERIFY")]
    pub skip_verify: bool,

    /// Log remote requests and responses
    #[arg(long, env = "STAGEHAND_RPC_DUMP")]
    pub dump: bool,

    /// Include bodies when dumping remote calls
    #[arg(long, env = "STAGEHAND_RPC_DUMP_BODY")]
    pub dump_body: bool,

    /// Runner name reported to the coordination server (defaults to the hostname)
    #[arg(long, env = "STAGEHAND_RUNNER_NAME")]
    pub name: Option<String>,

    /// Concurrent stages; 0 runs a single stage and exits
    #[arg(long, env = "STAGEHAND_RUNNER_CAPACITY", default_value_t = 2)]
    pub capacity: usize,

    /// Extra environment for every step (KEY=VALUE)
    #[arg(long = "env", env = "STAGEHAND_RUNNER_ENVIRON", value_delimiter = ',', value_parser = parse_key_val)]
    pub environ: Vec<(String, String)>,

    /// Directory holding stage workspaces
    #[arg(long, env = "STAGEHAND_RUNNER_ROOT")]
    pub root: Option<PathBuf>,

    /// Links created in every workspace (LINK=TARGET)
    #[arg(long = "symlink", env = "STAGEHAND_RUNNER_SYMLINKS", value_delimiter = ',', value_parser = parse_key_val)]
    pub symlinks: Vec<(String, String)>,

    /// Runner labels matched by the coordination server (KEY=VALUE)
    #[arg(long = "label", env = "STAGEHAND_RUNNER_LABELS", value_delimiter = ',', value_parser = parse_key_val)]
    pub labels: Vec<(String, String)>,

    /// Only run stages of repositories matching these globs
    #[arg(long = "limit-repo", env = "STAGEHAND_LIMIT_REPOS", value_delimiter = ',')]
    pub limit_repos: Vec<String>,

    /// Only run stages triggered by these events
    #[arg(long = "limit-event", env = "STAGEHAND_LIMIT_EVENTS", value_delimiter = ',')]
    pub limit_events: Vec<String>,

    /// Only run stages of trusted repositories
    #[arg(long, env = "STAGEHAND_LIMIT_TRUSTED")]
    pub limit_trusted: bool,

    /// Secret resolver endpoint
    #[arg(long, env = "STAGEHAND_SECRET_PLUGIN_ENDPOINT")]
    pub secret_endpoint: Option<String>,

    /// Secret resolver token
    #[arg(long, env = "STAGEHAND_SECRET_PLUGIN_TOKEN", hide_env_values = true)]
    pub secret_token: Option<String>,

    /// Accept invalid TLS certificates from the secret resolver
    #[arg(long, env = "STAGEHAND_SECRET_PLUGIN_SKIP_VERIFY")]
    pub secret_skip_verify: bool,

    /// Status server listen address; disabled when unset
    #[arg(long = "server-addr", env = "STAGEHAND_HTTP_BIND")]
    pub server_addr: Option<SocketAddr>,

    /// Status dashboard user; the dashboard is open when unset
    #[arg(long, env = "STAGEHAND_UI_USERNAME")]
    pub ui_username: Option<String>,

    /// Status dashboard password
    #[arg(long, env = "STAGEHAND_UI_PASSWORD", hide_env_values = true)]
    pub ui_password: Option<String>,

    /// Basic auth realm
    #[arg(long, env = "STAGEHAND_UI_REALM", default_value = "MyRealm")]
    pub ui_realm: String,

    /// Override the reported operating system
    #[arg(long, env = "STAGEHAND_PLATFORM_OS")]
    pub platform_os: Option<String>,

    /// Override the reported architecture
    #[arg(long, env = "STAGEHAND_PLATFORM_ARCH")]
    pub platform_arch: Option<String>,

    #[arg(long, env = "STAGEHAND_PLATFORM_VARIANT", default_value = "")]
    pub platform_variant: String,

    #[arg(long, env = "STAGEHAND_PLATFORM_KERNEL", default_value = "")]
    pub platform_kernel: String,

    /// Log format: text, json or journald
    #[arg(long, env = "STAGEHAND_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    #[arg(long, env = "STAGEHAND_DEBUG")]
    pub debug: bool,

    #[arg(long, env = "STAGEHAND_TRACE")]
    pub trace: bool,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

impl Args {
    pub fn into_config(self) -> Config {
        let runner_defaults = RunnerConfig::default();
        let platform_defaults = PlatformConfig::default();

        Config {
            client: ClientConfig {
                address: self.address,
                secret: self.secret,
                skip_verify: self.skip_verify,
                dump: self.dump,
                dump_body: self.dump_body,
            },
            runner: RunnerConfig {
                name: self.name.unwrap_or(runner_defaults.name),
                capacity: self.capacity,
                environ: BTreeMap::from_iter(self.environ),
                root: self.root.unwrap_or(runner_defaults.root),
                symlinks: BTreeMap::from_iter(self.symlinks),
                labels: BTreeMap::from_iter(self.labels),
            },
            limit: LimitConfig {
                repos: self.limit_repos,
                events: self.limit_events,
                trusted: self.limit_trusted,
            },
            secret: SecretConfig {
                endpoint: self.secret_endpoint,
                token: self.secret_token,
                skip_verify: self.secret_skip_verify,
            },
            server: ServerConfig {
                addr: self.server_addr,
            },
            dashboard: DashboardConfig {
                username: self.ui_username,
                password: self.ui_password,
                realm: self.ui_realm,
            },
            platform: PlatformConfig {
                os: self.platform_os.unwrap_or(platform_defaults.os),
                arch: self.platform_arch.unwrap_or(platform_defaults.arch),
                variant: self.platform_variant,
                kernel: self.platform_kernel,
            },
            diagnostics: DiagnosticsConfig {
                debug: self.debug,
                trace: self.trace,
                format: self.log_format,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let argv = std::iter::once("stagehand-agentd").chain(args.iter().copied());
        Args::try_parse_from(argv).unwrap().into_config()
    }

    #[test]
    fn defaults() {
        let cfg = parse(&["--address", "http://ci.local"]);
        assert_eq!(cfg.client.address, "http://ci.local");
        assert_eq!(cfg.runner.capacity, 2);
        assert!(!cfg.runner.name.is_empty());
        assert!(!cfg.server.is_enabled());
        assert_eq!(cfg.dashboard.realm, "MyRealm");
        assert_eq!(cfg.platform.os, std::env::consts::OS);
        assert_eq!(cfg.diagnostics.level(), "info");
        assert_eq!(cfg.diagnostics.format, LogFormat::Text);
        assert!(!cfg.secret.is_enabled());
    }

    #[test]
    fn secret_resolver_and_log_format() {
        let cfg = parse(&[
            "--address",
            "http://ci.local",
            "--secret-endpoint",
            "http://vault.local/secret",
            "--secret-token",
            "t0k",
            "--secret-skip-verify",
            "--log-format",
            "json",
        ]);
        assert!(cfg.secret.is_enabled());
        assert_eq!(cfg.secret.token.as_deref(), Some("t0k"));
        assert!(cfg.secret.skip_verify);
        assert_eq!(cfg.diagnostics.format, LogFormat::Json);
    }

    #[test]
    fn rejects_unknown_log_format() {
        let res = Args::try_parse_from([
            "stagehand-agentd",
            "--address",
            "x",
            "--log-format",
            "yaml",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn maps_and_lists() {
        let cfg = parse(&[
            "--address",
            "http://ci.local",
            "--env",
            "GOPROXY=off,CGO_ENABLED=0",
            "--label",
            "zone=eu",
            "--limit-repo",
            "octo/*,acme/*",
            "--server-addr",
            "127.0.0.1:3000",
            "--capacity",
            "0",
            "--trace",
        ]);
        assert_eq!(cfg.runner.environ["CGO_ENABLED"], "0");
        assert_eq!(cfg.runner.environ.len(), 2);
        assert_eq!(cfg.runner.labels["zone"], "eu");
        assert_eq!(cfg.limit.repos, vec!["octo/*", "acme/*"]);
        assert!(cfg.server.is_enabled());
        assert!(cfg.runner.mode().is_single_shot());
        assert_eq!(cfg.diagnostics.level(), "trace");
    }

    #[test]
    fn rejects_malformed_pairs() {
        let res = Args::try_parse_from(["stagehand-agentd", "--address", "x", "--env", "NOVALUE"]);
        assert!(res.is_err());
    }

    #[test]
    fn address_is_required() {
        assert!(Args::try_parse_from(["stagehand-agentd"]).is_err());
    }
}
