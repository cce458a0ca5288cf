use async_trait::async_trait;
use reqwest::StatusCode;
use stagehand_core::{CoreError, RemoteClient};
use stagehand_model::{ClientConfig, Filter, Stage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{error::RemoteError, source::StageSource};

const PING_PATH: &str = "/rpc/v2/ping";
const STAGE_PATH: &str = "/rpc/v2/stage";

pub(crate) const TOKEN_HEADER: &str = "X-Runner-Token";
pub(crate) const MACHINE_HEADER: &str = "X-Runner-Machine";

/// HTTP client for the coordination server RPCs.
pub struct HttpClient {
    endpoint: String,
    secret: String,
    http: reqwest::Client,
    dump: Option<Dump>,
}

#[derive(Debug, Clone, Copy)]
struct Dump {
    body: bool,
}

impl HttpClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(cfg.skip_verify)
            .build()?;

        Ok(Self {
            endpoint: cfg.address.trim_end_matches('/').to_string(),
            secret: cfg.secret.clone(),
            http,
            dump: cfg.dump.then_some(Dump {
                body: cfg.dump_body,
            }),
        })
    }

    #[inline]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `POST /rpc/v2/ping`; any 2xx answer counts as reachable.
    pub async fn ping(&self, machine: &str) -> Result<(), RemoteError> {
        let response = self
            .http
            .post(self.url(PING_PATH))
            .header(TOKEN_HEADER, &self.secret)
            .header(MACHINE_HEADER, machine)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        self.dump_response("ping", status, &body);

        check_status(status, body)
    }

    /// `POST /rpc/v2/stage` with the capability filter as body.
    ///
    /// `204 No Content` means there is no matching stage.
    pub async fn request_stage(&self, filter: &Filter) -> Result<Option<Stage>, RemoteError> {
        if let Some(dump) = self.dump
            && dump.body
        {
            debug!(target: "stagehand::dump", call = "stage", request = ?filter, "request");
        }

        let response = self
            .http
            .post(self.url(STAGE_PATH))
            .header(TOKEN_HEADER, &self.secret)
            .json(filter)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            trace!("no stage available");
            return Ok(None);
        }

        let body = response.text().await?;
        self.dump_response("stage", status, &body);
        check_status(status, body.clone())?;

        let stage: Stage = serde_json::from_str(&body).map_err(|e| {
            RemoteError::InvalidResponse(format!("failed to parse stage: {}, body: {}", e, body))
        })?;
        Ok(Some(stage))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn dump_response(&self, call: &'static str, status: StatusCode, body: &str) {
        match self.dump {
            Some(Dump { body: true }) => {
                debug!(target: "stagehand::dump", call, status = %status, body, "response")
            }
            Some(Dump { body: false }) => {
                debug!(target: "stagehand::dump", call, status = %status, "response")
            }
            None => {}
        }
    }
}

fn check_status(status: StatusCode, body: String) -> Result<(), RemoteError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RemoteError::Unauthorized);
    }
    if !status.is_success() {
        return Err(RemoteError::Status {
            code: status.as_u16(),
            body,
        });
    }
    Ok(())
}

#[async_trait]
impl RemoteClient for HttpClient {
    async fn ping(&self, ctx: &CancellationToken, machine: &str) -> Result<(), CoreError> {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(CoreError::Cancelled),
            res = HttpClient::ping(self, machine) => res.map_err(|e| CoreError::Remote(e.to_string())),
        }
    }
}

#[async_trait]
impl StageSource for HttpClient {
    async fn request(&self, filter: &Filter) -> Result<Option<Stage>, RemoteError> {
        self.request_stage(filter).await
    }
}
