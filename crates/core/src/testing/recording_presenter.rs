//! Presenter that records events for test assertions.

use std::sync::{Mutex, PoisonError};

use crate::backend::ReadyResult;
use crate::orchestrator::{Presenter, TaskId, TaskRef};
use crate::poller::PollError;
use crate::uploader::UploadError;
use crate::validator::ValidationError;

/// One presenter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    BatchRejected(ValidationError),
    TaskCreated(TaskRef),
    ValidationRejected {
        task: TaskRef,
        reason: ValidationError,
    },
    UploadStarted(TaskRef),
    UploadFailed {
        task: TaskRef,
        error: UploadError,
    },
    PollingStarted {
        task: TaskRef,
        problem_id: Option<String>,
    },
    Ready {
        task: TaskRef,
        result: ReadyResult,
    },
    PollFailed {
        task: TaskRef,
        error: PollError,
    },
    BusyChanged(bool),
}

impl PresenterEvent {
    /// The task this event belongs to, if any.
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            PresenterEvent::BatchRejected(_) | PresenterEvent::BusyChanged(_) => None,
            PresenterEvent::TaskCreated(task) | PresenterEvent::UploadStarted(task) => {
                Some(task.id)
            }
            PresenterEvent::ValidationRejected { task, .. }
            | PresenterEvent::UploadFailed { task, .. }
            | PresenterEvent::PollingStarted { task, .. }
            | PresenterEvent::Ready { task, .. }
            | PresenterEvent::PollFailed { task, .. } => Some(task.id),
        }
    }
}

/// Records every presenter call in order.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events so far.
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.lock().clone()
    }

    /// Events belonging to `task`, in order.
    pub fn events_for(&self, task: TaskId) -> Vec<PresenterEvent> {
        self.lock()
            .iter()
            .filter(|e| e.task_id() == Some(task))
            .cloned()
            .collect()
    }

    /// Every busy signal, in order.
    pub fn busy_transitions(&self) -> Vec<bool> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                PresenterEvent::BusyChanged(busy) => Some(*busy),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PresenterEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: PresenterEvent) {
        self.lock().push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn on_batch_rejected(&self, reason: &ValidationError) {
        self.push(PresenterEvent::BatchRejected(reason.clone()));
    }

    fn on_task_created(&self, task: &TaskRef) {
        self.push(PresenterEvent::TaskCreated(task.clone()));
    }

    fn on_validation_rejected(&self, task: &TaskRef, reason: &ValidationError) {
        self.push(PresenterEvent::ValidationRejected {
            task: task.clone(),
            reason: reason.clone(),
        });
    }

    fn on_upload_started(&self, task: &TaskRef) {
        self.push(PresenterEvent::UploadStarted(task.clone()));
    }

    fn on_upload_failed(&self, task: &TaskRef, error: &UploadError) {
        self.push(PresenterEvent::UploadFailed {
            task: task.clone(),
            error: error.clone(),
        });
    }

    fn on_polling_started(&self, task: &TaskRef, problem_id: Option<&str>) {
        self.push(PresenterEvent::PollingStarted {
            task: task.clone(),
            problem_id: problem_id.map(str::to_string),
        });
    }

    fn on_ready(&self, task: &TaskRef, result: &ReadyResult) {
        self.push(PresenterEvent::Ready {
            task: task.clone(),
            result: result.clone(),
        });
    }

    fn on_poll_failed(&self, task: &TaskRef, error: &PollError) {
        self.push(PresenterEvent::PollFailed {
            task: task.clone(),
            error: error.clone(),
        });
    }

    fn on_busy_changed(&self, busy: bool) {
        self.push(PresenterEvent::BusyChanged(busy));
    }
}
