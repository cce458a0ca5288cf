use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::header,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use stagehand_core::{History, history::StageEntry};
use stagehand_model::DashboardConfig;

use crate::{auth::require_auth, error::ApiError, metrics::StageMetrics};

/// Shared state of the status routes.
#[derive(Clone)]
pub struct ApiState {
    pub history: History,
    pub metrics: Arc<StageMetrics>,
    pub dashboard: Arc<DashboardConfig>,
}

/// Build the status router.
///
/// Routes:
/// - GET /healthz - liveness check, always open
/// - GET /api/v1/stages - recent stages, newest first
/// - GET /metrics - Prometheus exposition
pub fn router(state: ApiState) -> Router {
    let guarded = Router::new()
        .route("/api/v1/stages", get(list_stages))
        .route("/metrics", get(metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(guarded)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct StagesResponse {
    stages: Vec<StageEntry>,
}

/// GET /healthz
async fn healthz() -> &'static str {
    "OK"
}

/// GET /api/v1/stages
async fn list_stages(State(state): State<ApiState>) -> Json<StagesResponse> {
    Json(StagesResponse {
        stages: state.history.entries(),
    })
}

/// GET /metrics
async fn metrics(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let (content_type, body) = state.metrics.render(&state.history)?;
    Ok(([(header::CONTENT_TYPE, content_type)], body))
}
