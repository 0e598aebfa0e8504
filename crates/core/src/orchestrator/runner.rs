//! Upload orchestrator implementation.
//!
//! Each valid file of a batch gets its own tokio task that uploads and then
//! polls, independently of its siblings.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::backend::Backend;
use crate::config::Config;
use crate::file::FileCandidate;
use crate::poller::{PollSchedule, Poller};
use crate::uploader::Uploader;
use crate::validator::{Limits, ValidationError, Validator};

use super::counter::{InFlightCounter, InFlightGuard};
use super::presenter::Presenter;
use super::types::{TaskId, TaskRef, TaskReport, TaskState};

/// Drives batches of files through validation, upload and polling.
pub struct UploadOrchestrator {
    validator: Validator,
    uploader: Arc<Uploader>,
    poller: Arc<Poller>,
    presenter: Arc<dyn Presenter>,
    in_flight: InFlightCounter,
    next_id: AtomicU64,
}

impl UploadOrchestrator {
    pub fn new(
        validator: Validator,
        backend: Arc<dyn Backend>,
        schedule: PollSchedule,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            validator,
            uploader: Arc::new(Uploader::new(Arc::clone(&backend))),
            poller: Arc::new(Poller::new(backend, schedule)),
            in_flight: InFlightCounter::new(Arc::clone(&presenter)),
            presenter,
            next_id: AtomicU64::new(1),
        }
    }

    /// Create an orchestrator using the limits and polling settings of `config`.
    pub fn from_config(
        config: &Config,
        backend: Arc<dyn Backend>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self::new(
            Validator::new(Limits::from(&config.limits)),
            backend,
            PollSchedule::from(&config.polling),
            presenter,
        )
    }

    /// Number of tasks across all batches that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.active()
    }

    /// Submit a batch of files.
    ///
    /// The batch as a whole is refused (and nothing is launched) when it is
    /// empty or larger than the configured maximum. Otherwise every file is
    /// validated in order; rejected files end immediately, valid files are
    /// launched as concurrent tasks and this returns without waiting for
    /// them.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn submit(&self, files: Vec<FileCandidate>) -> Result<BatchHandle, ValidationError> {
        if let Err(e) = self.validator.check_batch(files.len()) {
            info!(count = files.len(), reason = %e, "Refusing batch");
            self.presenter.on_batch_rejected(&e);
            return Err(e);
        }

        let counter = InFlightCounter::silent();
        let mut slots = Vec::with_capacity(files.len());

        for file in files {
            let task = TaskRef::new(self.allocate_id(), file.name());
            let started_at = Utc::now();
            self.presenter.on_task_created(&task);

            if let Err(reason) = self.validator.validate(&file) {
                debug!(task = %task.id, file = %task.file_name, reason = %reason, "File failed validation");
                self.presenter.on_validation_rejected(&task, &reason);
                slots.push(Slot::Finished(TaskReport {
                    task,
                    state: TaskState::Rejected(reason),
                    started_at,
                    finished_at: Utc::now(),
                }));
                continue;
            }

            let guards = [counter.enter(), self.in_flight.enter()];
            let file_task = FileTask {
                task: task.clone(),
                file,
                uploader: Arc::clone(&self.uploader),
                poller: Arc::clone(&self.poller),
                presenter: Arc::clone(&self.presenter),
                started_at,
            };
            let handle = tokio::spawn(file_task.run(guards));
            slots.push(Slot::Running { task, handle });
        }

        Ok(BatchHandle { slots, counter })
    }

    fn allocate_id(&self) -> TaskId {
        TaskId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// Upload-then-poll sequence for one valid file.
struct FileTask {
    task: TaskRef,
    file: FileCandidate,
    uploader: Arc<Uploader>,
    poller: Arc<Poller>,
    presenter: Arc<dyn Presenter>,
    started_at: DateTime<Utc>,
}

impl FileTask {
    /// Runs to a terminal state. The outcome is rendered before `guards` are
    /// released, so the busy signal clears only after the last outcome.
    async fn run(self, guards: [InFlightGuard; 2]) -> TaskReport {
        let state = self.drive().await;
        info!(
            task = %self.task.id,
            file = %self.task.file_name,
            state = state.as_str(),
            "Task finished"
        );

        let report = TaskReport {
            task: self.task,
            state,
            started_at: self.started_at,
            finished_at: Utc::now(),
        };
        drop(guards);
        report
    }

    async fn drive(&self) -> TaskState {
        let mut state = TaskState::Validating;

        self.advance(&mut state, TaskState::Uploading);
        self.presenter.on_upload_started(&self.task);

        let token = match self.uploader.upload(&self.file).await {
            Ok(token) => token,
            Err(e) => {
                self.presenter.on_upload_failed(&self.task, &e);
                self.advance(&mut state, TaskState::UploadFailed(e));
                return state;
            }
        };

        self.presenter
            .on_polling_started(&self.task, token.problem_id());
        self.advance(
            &mut state,
            TaskState::Polling {
                token: token.clone(),
            },
        );

        match self.poller.poll(&token).await {
            Ok(result) => {
                self.presenter.on_ready(&self.task, &result);
                self.advance(&mut state, TaskState::Ready(result));
            }
            Err(e) => {
                self.presenter.on_poll_failed(&self.task, &e);
                self.advance(&mut state, TaskState::PollFailed(e));
            }
        }
        state
    }

    fn advance(&self, state: &mut TaskState, next: TaskState) {
        debug_assert!(
            state.can_transition_to(&next),
            "illegal transition {} -> {}",
            state.as_str(),
            next.as_str()
        );
        debug!(
            task = %self.task.id,
            from = state.as_str(),
            to = next.as_str(),
            "Task state changed"
        );
        *state = next;
    }
}

enum Slot {
    Finished(TaskReport),
    Running {
        task: TaskRef,
        handle: JoinHandle<TaskReport>,
    },
}

/// Tasks launched by one [`UploadOrchestrator::submit`] call.
///
/// Dropping the handle detaches the tasks; they still run to completion.
pub struct BatchHandle {
    slots: Vec<Slot>,
    counter: InFlightCounter,
}

impl BatchHandle {
    /// Number of tasks of this batch that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.counter.active()
    }

    /// Number of files in the batch, rejected ones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Wait for every task and return one report per file in submission
    /// order. A task that panicked has no report.
    pub async fn join(self) -> Vec<TaskReport> {
        let pending = self.slots.into_iter().map(|slot| async move {
            match slot {
                Slot::Finished(report) => Some(report),
                Slot::Running { task, handle } => match handle.await {
                    Ok(report) => Some(report),
                    Err(e) => {
                        error!(task = %task.id, file = %task.file_name, error = %e, "File task aborted");
                        None
                    }
                },
            }
        });

        futures::future::join_all(pending)
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

impl std::fmt::Debug for BatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchHandle")
            .field("files", &self.slots.len())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
