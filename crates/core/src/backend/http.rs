//! HTTP backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;
use crate::file::FileCandidate;

use super::{
    extract_detail, Backend, BackendError, ResultResponse, ResultStatus, UploadResponse,
    UploadToken,
};

/// Backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new HttpBackend with the given configuration.
    pub fn new(config: &ApiConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| BackendError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, &config.base_url))
    }

    /// Create a backend on top of an existing client.
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn upload_url(&self) -> String {
        format!("{}/api/upload", self.base_url)
    }

    fn result_url(&self, token: &UploadToken) -> String {
        format!(
            "{}/api/result?fileName={}",
            self.base_url,
            urlencoding::encode(token.as_str())
        )
    }

    /// Post an arbitrary JSON document to the echo endpoint and return the
    /// backend's reply. Debug helper, not used by the upload workflow.
    pub async fn echo(&self, payload: &Value) -> Result<Value, BackendError> {
        let url = format!("{}/api/echo", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response, |status| format!("Echo failed ({})", status)).await?;

        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn upload(&self, file: &FileCandidate) -> Result<UploadToken, BackendError> {
        let mut part = multipart::Part::bytes(file.content().to_vec()).file_name(file.name().to_string());
        if !file.media_type().is_empty() {
            part = part
                .mime_str(file.media_type())
                .map_err(|e| BackendError::InvalidRequest(format!("Invalid media type: {}", e)))?;
        }
        let form = multipart::Form::new().part("file", part);

        debug!(file = file.name(), size = file.size(), "Posting upload");

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response, |status| {
            format!("Upload failed for {} ({})", file.name(), status)
        })
        .await?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(UploadToken::new(body.file_name, body.problem_id))
    }

    async fn check_result(&self, token: &UploadToken) -> Result<ResultStatus, BackendError> {
        let response = self
            .client
            .get(self.result_url(token))
            .send()
            .await
            .map_err(map_send_error)?;

        let response =
            check_status(response, |status| format!("Result check failed ({})", status)).await?;

        let body: ResultResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(body.into_status())
    }
}

fn map_send_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_connect() {
        BackendError::ConnectionFailed(e.to_string())
    } else {
        BackendError::InvalidRequest(e.to_string())
    }
}

/// Pass successful responses through; turn anything else into
/// [`BackendError::Status`] using the body's `detail` when present.
async fn check_status<F>(response: Response, fallback: F) -> Result<Response, BackendError>
where
    F: FnOnce(u16) -> String,
{
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = extract_detail(&body).unwrap_or_else(|| fallback(status.as_u16()));
    debug!(status = status.as_u16(), detail = %detail, "Backend returned an error");

    Err(BackendError::Status {
        status: status.as_u16(),
        detail,
    })
}
