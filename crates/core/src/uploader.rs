//! Single-file upload.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::backend::{Backend, BackendError, UploadToken};
use crate::file::FileCandidate;

/// Errors that end a task during upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// Backend refused the upload.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    #[error("upload request failed: {0}")]
    Transport(String),

    #[error("invalid upload response: {0}")]
    InvalidResponse(String),
}

impl UploadError {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            UploadError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable explanation of the failure.
    pub fn detail(&self) -> String {
        match self {
            UploadError::Rejected { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

impl From<BackendError> for UploadError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Status { status, detail } => UploadError::Rejected { status, detail },
            BackendError::InvalidResponse(msg) => UploadError::InvalidResponse(msg),
            other => UploadError::Transport(other.to_string()),
        }
    }
}

/// Sends one file to the backend. Never retries.
pub struct Uploader {
    backend: Arc<dyn Backend>,
}

impl Uploader {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn upload(&self, file: &FileCandidate) -> Result<UploadToken, UploadError> {
        debug!(
            backend = self.backend.name(),
            file = file.name(),
            size = file.size(),
            "Uploading file"
        );

        let token = self.backend.upload(file).await?;
        if token.as_str().is_empty() {
            return Err(UploadError::InvalidResponse(
                "backend returned an empty fileName".to_string(),
            ));
        }

        info!(
            file = file.name(),
            token = %token,
            problem_id = token.problem_id().unwrap_or("-"),
            "Upload accepted"
        );
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    #[tokio::test]
    async fn test_upload_returns_token() {
        let backend = Arc::new(MockBackend::new());
        backend
            .set_upload_response("a.json", Ok(UploadToken::new("abc", Some("P1".into()))))
            .await;

        let uploader = Uploader::new(backend.clone());
        let token = uploader
            .upload(&FileCandidate::from_name("a.json", b"{}".to_vec()))
            .await
            .unwrap();

        assert_eq!(token.as_str(), "abc");
        assert_eq!(token.problem_id(), Some("P1"));
        assert_eq!(backend.upload_count().await, 1);
    }

    #[tokio::test]
    async fn test_upload_status_error_keeps_detail() {
        let backend = Arc::new(MockBackend::new());
        backend
            .set_upload_response(
                "a.json",
                Err(BackendError::Status {
                    status: 500,
                    detail: "server error".into(),
                }),
            )
            .await;

        let uploader = Uploader::new(backend.clone());
        let err = uploader
            .upload(&FileCandidate::from_name("a.json", b"{}".to_vec()))
            .await
            .unwrap_err();

        assert_eq!(err.http_status(), Some(500));
        assert_eq!(err.detail(), "server error");
        assert_eq!(backend.upload_count().await, 1);
    }

    #[tokio::test]
    async fn test_upload_empty_token_is_invalid() {
        let backend = Arc::new(MockBackend::new());
        backend
            .set_upload_response("a.json", Ok(UploadToken::new("", None)))
            .await;

        let err = Uploader::new(backend)
            .upload(&FileCandidate::from_name("a.json", b"{}".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidResponse(_)));
    }

    #[test]
    fn test_transport_errors_map_to_transport() {
        let err = UploadError::from(BackendError::Timeout);
        assert_eq!(err, UploadError::Transport("Request timeout".into()));
        assert_eq!(err.http_status(), None);
    }
}
