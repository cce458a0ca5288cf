use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use stagehand_model::DashboardConfig;

use crate::{error::ApiError, http::ApiState};

/// Basic auth guard; a dashboard without a username is open.
pub(crate) async fn require_auth(
    State(state): State<ApiState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if authorized(&state.dashboard, header) {
        Ok(next.run(req).await)
    } else {
        Err(ApiError::Unauthorized {
            realm: state.dashboard.realm.clone(),
        })
    }
}

fn authorized(dashboard: &DashboardConfig, header: Option<&str>) -> bool {
    let Some(username) = dashboard.username.as_deref() else {
        return true;
    };
    let Some((user, pass)) = header.and_then(decode_basic) else {
        return false;
    };
    user == username && pass == dashboard.password.as_deref().unwrap_or_default()
}

fn decode_basic(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}
