//! Types for backend operations.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::file::FileCandidate;

/// Errors that can occur while talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Backend answered with a non-success status.
    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Correlation handle returned by the backend for an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadToken {
    token: String,
    problem_id: Option<String>,
}

impl UploadToken {
    pub fn new(token: impl Into<String>, problem_id: Option<String>) -> Self {
        Self {
            token: token.into(),
            problem_id,
        }
    }

    /// Opaque value passed back to the result endpoint.
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// Problem identifier found in the uploaded document, for display.
    pub fn problem_id(&self) -> Option<&str> {
        self.problem_id.as_deref()
    }
}

impl fmt::Display for UploadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// Links to the derived artifacts of a processed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyResult {
    /// Optimized JSON document.
    pub json_url: String,
    /// Plotted PNG image.
    pub image_url: String,
    /// How long the links stay valid.
    pub expires_in_minutes: Option<u64>,
    pub problem_id: Option<String>,
}

/// Outcome of a single result query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultStatus {
    /// Still processing.
    Pending,
    /// Artifacts are available.
    Ready(ReadyResult),
    /// Backend reported the upload as finished but unusable.
    Failed { reason: String },
}

/// Backend used by the upload workflow.
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Returns the backend name for logging.
    fn name(&self) -> &str;

    /// Submit one file. Returns the correlation handle on success.
    async fn upload(&self, file: &FileCandidate) -> Result<UploadToken, BackendError>;

    /// Ask whether the artifacts for an upload are available.
    async fn check_result(&self, token: &UploadToken) -> Result<ResultStatus, BackendError>;
}

// ============================================================================
// Wire types
// ============================================================================

/// Body of a successful `POST /api/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_name: String,
    #[serde(default, deserialize_with = "deserialize_problem_id")]
    pub problem_id: Option<String>,
}

/// Body of a successful `GET /api/result`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultResponse {
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_minutes: Option<u64>,
    #[serde(
        default,
        deserialize_with = "deserialize_problem_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub problem_id: Option<String>,
}

impl ResultResponse {
    /// Interpret the response. A ready response must carry both links.
    pub fn into_status(self) -> ResultStatus {
        if !self.ready {
            return ResultStatus::Pending;
        }
        match (self.json_url, self.image_url) {
            (Some(json_url), Some(image_url)) => ResultStatus::Ready(ReadyResult {
                json_url,
                image_url,
                expires_in_minutes: self.expires_in_minutes,
                problem_id: self.problem_id,
            }),
            (json_url, image_url) => ResultStatus::Failed {
                reason: format!(
                    "result reported ready without {}",
                    match (json_url, image_url) {
                        (None, None) => "any links",
                        (None, Some(_)) => "a JSON link",
                        _ => "an image link",
                    }
                ),
            },
        }
    }
}

/// Error body returned by the backend on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: Value,
}

/// Best-effort extraction of the `detail` field from an error body.
///
/// Returns `None` if the body is not JSON or carries no usable detail.
pub fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Problem ids are usually strings but uploaded documents may carry numbers.
pub fn problem_id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn deserialize_problem_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(problem_id_from_value))
}
