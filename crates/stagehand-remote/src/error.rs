use stagehand_core::CoreError;
use stagehand_model::StageId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("http request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("remote server rejected the runner credentials")]
    Unauthorized,

    #[error("remote server returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("stage {id} failed: {reason}")]
    Stage { id: StageId, reason: String },

    #[error("poller worker aborted: {0}")]
    Worker(String),

    #[error("cancelled")]
    Cancelled,
}

impl RemoteError {
    /// Errors that retrying cannot fix.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, RemoteError::Unauthorized | RemoteError::Worker(_))
    }

    /// Errors worth pausing for before the next request.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::HttpRequest(_) | RemoteError::Status { .. } | RemoteError::InvalidResponse(_)
        )
    }
}

impl From<RemoteError> for CoreError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Cancelled => CoreError::Cancelled,
            other => CoreError::Poll(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_core_error() {
        assert_eq!(CoreError::from(RemoteError::Cancelled), CoreError::Cancelled);
        assert_eq!(
            CoreError::from(RemoteError::Unauthorized),
            CoreError::Poll("remote server rejected the runner credentials".into())
        );
    }

    #[test]
    fn classification() {
        assert!(RemoteError::Unauthorized.is_fatal());
        assert!(!RemoteError::Unauthorized.is_transient());

        let status = RemoteError::Status {
            code: 502,
            body: "bad gateway".into(),
        };
        assert!(status.is_transient());
        assert!(!status.is_fatal());

        let stage = RemoteError::Stage {
            id: 1,
            reason: "exit code: 1".into(),
        };
        assert!(!stage.is_transient());
        assert!(!stage.is_fatal());
    }
}
