use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use stagehand_model::{SecretConfig, Stage};
use tracing::trace;

use crate::error::RemoteError;

pub(crate) const SECRET_TOKEN_HEADER: &str = "X-Secret-Token";

/// Looks up named secrets for a stage.
#[async_trait]
pub trait SecretProvider: Send + Sync + 'static {
    /// `Ok(None)` when the provider has no secret of that name for this stage.
    async fn find(&self, name: &str, stage: &Stage) -> Result<Option<String>, RemoteError>;
}

#[derive(Debug, Serialize)]
struct SecretRequest<'a> {
    name: &'a str,
    repo: &'a str,
    event: &'a str,
    trusted: bool,
}

#[derive(Debug, Deserialize)]
struct SecretResponse {
    data: String,
}

/// [`SecretProvider`] backed by an external HTTP resolver.
///
/// Each lookup is a `POST {endpoint}` carrying the secret name and the stage's
/// repository and event; `404` or `204` means the secret does not exist.
pub struct ExternalSecrets {
    endpoint: String,
    token: String,
    http: reqwest::Client,
}

impl ExternalSecrets {
    /// `Ok(None)` when no resolver endpoint is configured.
    pub fn from_config(cfg: &SecretConfig) -> Result<Option<Self>, RemoteError> {
        if !cfg.is_enabled() {
            return Ok(None);
        }
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(cfg.skip_verify)
            .build()?;
        Ok(Some(Self {
            endpoint: cfg.endpoint.clone().unwrap_or_default().trim().to_string(),
            token: cfg.token.clone().unwrap_or_default(),
            http,
        }))
    }

    #[inline]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SecretProvider for ExternalSecrets {
    async fn find(&self, name: &str, stage: &Stage) -> Result<Option<String>, RemoteError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(SECRET_TOKEN_HEADER, &self.token)
            .json(&SecretRequest {
                name,
                repo: &stage.repo.slug,
                event: &stage.event,
                trusted: stage.repo.trusted,
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            trace!(name, "secret not found");
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RemoteError::Unauthorized);
        }
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let secret: SecretResponse = serde_json::from_str(&body).map_err(|e| {
            RemoteError::InvalidResponse(format!("failed to parse secret {name}: {e}"))
        })?;
        Ok(Some(secret.data))
    }
}
