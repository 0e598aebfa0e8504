//! Types for the upload orchestrator.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::backend::{ReadyResult, UploadToken};
use crate::poller::PollError;
use crate::uploader::UploadError;
use crate::validator::ValidationError;

/// Stable handle of one file task, unique per orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What presentation events refer to: the task handle plus the file name
/// for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef {
    pub id: TaskId,
    pub file_name: String,
}

impl TaskRef {
    pub fn new(id: TaskId, file_name: impl Into<String>) -> Self {
        Self {
            id,
            file_name: file_name.into(),
        }
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.file_name)
    }
}

/// Lifecycle of one file task.
///
/// `Validating → {Rejected | Uploading} → {UploadFailed | Polling} →
/// {PollFailed | Ready}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Validating,
    Rejected(ValidationError),
    Uploading,
    UploadFailed(UploadError),
    Polling { token: UploadToken },
    PollFailed(PollError),
    Ready(ReadyResult),
}

impl TaskState {
    /// Returns the state name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Validating => "validating",
            TaskState::Rejected(_) => "rejected",
            TaskState::Uploading => "uploading",
            TaskState::UploadFailed(_) => "upload_failed",
            TaskState::Polling { .. } => "polling",
            TaskState::PollFailed(_) => "poll_failed",
            TaskState::Ready(_) => "ready",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Rejected(_)
                | TaskState::UploadFailed(_)
                | TaskState::PollFailed(_)
                | TaskState::Ready(_)
        )
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: &TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Validating, TaskState::Rejected(_))
                | (TaskState::Validating, TaskState::Uploading)
                | (TaskState::Uploading, TaskState::UploadFailed(_))
                | (TaskState::Uploading, TaskState::Polling { .. })
                | (TaskState::Polling { .. }, TaskState::PollFailed(_))
                | (TaskState::Polling { .. }, TaskState::Ready(_))
        )
    }
}

/// Final record of a file task.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: TaskRef,
    /// Always a terminal state.
    pub state: TaskState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TaskReport {
    pub fn is_ready(&self) -> bool {
        matches!(self.state, TaskState::Ready(_))
    }

    pub fn ready_result(&self) -> Option<&ReadyResult> {
        match &self.state {
            TaskState::Ready(result) => Some(result),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_display() {
        assert_eq!(TaskId::new(7).to_string(), "#7");
        assert_eq!(TaskRef::new(TaskId::new(7), "a.json").to_string(), "#7 a.json");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TaskState::Validating.is_terminal());
        assert!(!TaskState::Uploading.is_terminal());
        assert!(!TaskState::Polling {
            token: UploadToken::new("t", None)
        }
        .is_terminal());
        assert!(TaskState::Rejected(ValidationError::NoFiles).is_terminal());
        assert!(TaskState::PollFailed(PollError::Timeout { attempts: 30 }).is_terminal());
    }

    #[test]
    fn test_transitions() {
        let polling = TaskState::Polling {
            token: UploadToken::new("t", None),
        };
        assert!(TaskState::Validating.can_transition_to(&TaskState::Uploading));
        assert!(TaskState::Uploading.can_transition_to(&polling));
        assert!(polling.can_transition_to(&TaskState::PollFailed(PollError::Timeout {
            attempts: 1
        })));
        assert!(!TaskState::Validating.can_transition_to(&polling));
        assert!(!TaskState::Uploading.can_transition_to(&TaskState::Uploading));
        assert!(!TaskState::Rejected(ValidationError::NoFiles)
            .can_transition_to(&TaskState::Uploading));
    }
}
