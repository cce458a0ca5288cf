//! Status endpoint of the runner: health check, recent stage history and
//! Prometheus metrics, served over HTTP with optional basic auth.

mod error;
pub use error::ApiError;

mod auth;
mod metrics;
pub use metrics::StageMetrics;

mod http;
pub use http::{ApiState, router};

mod server;
pub use server::StatusApi;
