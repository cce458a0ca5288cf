//! Plain data types shared by every stagehand crate.
//!
//! Nothing in here performs IO: configuration groups, the polling mode,
//! the capability filter sent to the remote server and the stage payload it returns.

mod config;
pub use config::{
    ClientConfig, Config, DashboardConfig, DiagnosticsConfig, LogFormat, PlatformConfig,
    RunnerConfig, SecretConfig, ServerConfig,
};

mod error;
pub use error::ConfigError;

mod limit;
pub use limit::LimitConfig;

mod mode;
pub use mode::RunnerMode;

mod filter;
pub use filter::{FILTER_KIND, FILTER_TYPE, Filter};

mod stage;
pub use stage::{RepoRef, Stage, StageId, Step};
