//! Result polling.
//!
//! The [`Poller`] queries the backend for an upload's artifacts on a fixed
//! [`PollSchedule`] until they are ready, the backend reports an error, or
//! the attempt budget runs out.

mod schedule;

pub use schedule::{Attempt, PollSchedule, RetryError};

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendError, ReadyResult, ResultStatus, UploadToken};

/// Errors that end a task while waiting for its result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// Backend answered a result query with a non-success status.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    #[error("Timed out waiting for plotted image after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// Backend reported the upload as unusable.
    #[error("processing failed: {reason}")]
    Failed { reason: String },

    #[error("result request failed: {0}")]
    Transport(String),

    #[error("invalid result response: {0}")]
    InvalidResponse(String),
}

impl PollError {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            PollError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::Timeout { .. })
    }

    /// Human-readable explanation of the failure.
    pub fn detail(&self) -> String {
        match self {
            PollError::Rejected { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

impl From<BackendError> for PollError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Status { status, detail } => PollError::Rejected { status, detail },
            BackendError::InvalidResponse(msg) => PollError::InvalidResponse(msg),
            other => PollError::Transport(other.to_string()),
        }
    }
}

/// Waits for the artifacts of one upload.
pub struct Poller {
    backend: Arc<dyn Backend>,
    schedule: PollSchedule,
}

impl Poller {
    pub fn new(backend: Arc<dyn Backend>, schedule: PollSchedule) -> Self {
        Self { backend, schedule }
    }

    /// Poll until the result is ready.
    ///
    /// Queries for the same token never overlap. Any error response ends
    /// polling immediately.
    pub async fn poll(&self, token: &UploadToken) -> Result<ReadyResult, PollError> {
        match self.schedule.run(|attempt| self.query(token, attempt)).await {
            Ok(result) => {
                info!(token = %token, "Result ready");
                Ok(result)
            }
            Err(RetryError::Failed(err)) => {
                warn!(token = %token, error = %err, "Result polling failed");
                Err(err)
            }
            Err(RetryError::Exhausted { attempts }) => {
                warn!(token = %token, attempts, "Gave up waiting for result");
                Err(PollError::Timeout { attempts })
            }
        }
    }

    async fn query(
        &self,
        token: &UploadToken,
        attempt: u32,
    ) -> Result<Attempt<ReadyResult>, PollError> {
        match self.backend.check_result(token).await? {
            ResultStatus::Ready(result) => Ok(Attempt::Ready(result)),
            ResultStatus::Pending => {
                debug!(
                    token = %token,
                    attempt,
                    max_attempts = self.schedule.max_attempts,
                    "Result not ready yet"
                );
                Ok(Attempt::Pending)
            }
            ResultStatus::Failed { reason } => Err(PollError::Failed { reason }),
        }
    }
}
