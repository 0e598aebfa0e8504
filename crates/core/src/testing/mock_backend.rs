//! Mock backend for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::backend::{Backend, BackendError, ResultStatus, UploadToken};
use crate::file::FileCandidate;

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    /// Name of the uploaded file.
    pub file_name: String,
    /// Size of the uploaded content in bytes.
    pub size: u64,
    /// When the upload was made.
    pub timestamp: chrono::DateTime<Utc>,
}

/// A recorded result query for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedQuery {
    /// The token that was queried.
    pub token: String,
    /// When the query was made, on the (possibly paused) tokio clock.
    pub at: tokio::time::Instant,
}

/// Mock implementation of the Backend trait.
///
/// Provides controllable behavior for testing:
/// - Scripted upload responses per file name
/// - Scripted result sequences per token
/// - Delays for both operations
/// - Track uploads and queries for assertions
///
/// Unscripted uploads succeed with the token `"{file name}-token"`.
/// Unscripted (or exhausted) result sequences answer `Pending`.
///
/// # Example
///
/// ```rust,ignore
/// use bookopt_core::testing::{MockBackend, fixtures};
///
/// let backend = MockBackend::new();
/// backend
///     .set_upload_response("a.json", Ok(UploadToken::new("abc", Some("P1".into()))))
///     .await;
/// backend
///     .set_result_sequence(
///         "abc",
///         vec![
///             Ok(ResultStatus::Pending),
///             Ok(ResultStatus::Ready(fixtures::ready_result("abc"))),
///         ],
///     )
///     .await;
/// ```
#[derive(Debug, Default)]
pub struct MockBackend {
    upload_responses: Arc<RwLock<HashMap<String, Result<UploadToken, BackendError>>>>,
    result_sequences: Arc<RwLock<HashMap<String, VecDeque<Result<ResultStatus, BackendError>>>>>,
    upload_delay: Arc<RwLock<Duration>>,
    upload_delays: Arc<RwLock<HashMap<String, Duration>>>,
    result_delay: Arc<RwLock<Duration>>,
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    queries: Arc<RwLock<Vec<RecordedQuery>>>,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response for uploads of `file_name`.
    pub async fn set_upload_response(
        &self,
        file_name: &str,
        response: Result<UploadToken, BackendError>,
    ) {
        self.upload_responses
            .write()
            .await
            .insert(file_name.to_string(), response);
    }

    /// Set the responses to successive result queries for `token`.
    pub async fn set_result_sequence(
        &self,
        token: &str,
        sequence: Vec<Result<ResultStatus, BackendError>>,
    ) {
        self.result_sequences
            .write()
            .await
            .insert(token.to_string(), sequence.into());
    }

    /// Delay every upload by `delay`.
    pub async fn set_upload_delay(&self, delay: Duration) {
        *self.upload_delay.write().await = delay;
    }

    /// Delay uploads of `file_name` by `delay`, overriding the global delay.
    pub async fn set_upload_delay_for(&self, file_name: &str, delay: Duration) {
        self.upload_delays
            .write()
            .await
            .insert(file_name.to_string(), delay);
    }

    /// Delay every result query by `delay`.
    pub async fn set_result_delay(&self, delay: Duration) {
        *self.result_delay.write().await = delay;
    }

    /// Get all recorded uploads.
    pub async fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    pub async fn upload_count(&self) -> usize {
        self.uploads.read().await.len()
    }

    /// Get all recorded result queries.
    pub async fn recorded_result_queries(&self) -> Vec<RecordedQuery> {
        self.queries.read().await.clone()
    }

    /// Number of result queries made for `token`.
    pub async fn result_query_count(&self, token: &str) -> usize {
        self.queries
            .read()
            .await
            .iter()
            .filter(|q| q.token == token)
            .count()
    }

    /// Total number of result queries across all tokens.
    pub async fn total_result_queries(&self) -> usize {
        self.queries.read().await.len()
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload(&self, file: &FileCandidate) -> Result<UploadToken, BackendError> {
        self.uploads.write().await.push(RecordedUpload {
            file_name: file.name().to_string(),
            size: file.size(),
            timestamp: Utc::now(),
        });

        let delay = match self.upload_delays.read().await.get(file.name()) {
            Some(delay) => *delay,
            None => *self.upload_delay.read().await,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.upload_responses.read().await.get(file.name()) {
            Some(response) => response.clone(),
            None => Ok(UploadToken::new(format!("{}-token", file.name()), None)),
        }
    }

    async fn check_result(&self, token: &UploadToken) -> Result<ResultStatus, BackendError> {
        self.queries.write().await.push(RecordedQuery {
            token: token.as_str().to_string(),
            at: tokio::time::Instant::now(),
        });

        let delay = *self.result_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut sequences = self.result_sequences.write().await;
        match sequences.get_mut(token.as_str()).and_then(VecDeque::pop_front) {
            Some(response) => response,
            None => Ok(ResultStatus::Pending),
        }
    }
}
