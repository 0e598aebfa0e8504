//! Presentation events emitted by the orchestrator.

use tracing::{info, warn};

use crate::backend::ReadyResult;
use crate::poller::PollError;
use crate::uploader::UploadError;
use crate::validator::ValidationError;

use super::types::TaskRef;

/// Receives per-file lifecycle events and renders them.
///
/// Called from task context, possibly from several tasks at once, so
/// implementations must be cheap and must not block.
pub trait Presenter: Send + Sync {
    /// The whole batch was refused; no task was created.
    fn on_batch_rejected(&self, reason: &ValidationError);

    /// A task was created for a file and is being validated.
    fn on_task_created(&self, task: &TaskRef);

    fn on_validation_rejected(&self, task: &TaskRef, reason: &ValidationError);

    fn on_upload_started(&self, task: &TaskRef);

    fn on_upload_failed(&self, task: &TaskRef, error: &UploadError);

    fn on_polling_started(&self, task: &TaskRef, problem_id: Option<&str>);

    fn on_ready(&self, task: &TaskRef, result: &ReadyResult);

    fn on_poll_failed(&self, task: &TaskRef, error: &PollError);

    /// At least one task is active (`true`) or none is (`false`).
    fn on_busy_changed(&self, busy: bool);
}

/// Presenter that writes every event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn on_batch_rejected(&self, reason: &ValidationError) {
        warn!(reason = %reason, "Batch rejected");
    }

    fn on_task_created(&self, task: &TaskRef) {
        info!(task = %task.id, file = %task.file_name, "Validating file");
    }

    fn on_validation_rejected(&self, task: &TaskRef, reason: &ValidationError) {
        warn!(task = %task.id, file = %task.file_name, reason = %reason, "File rejected");
    }

    fn on_upload_started(&self, task: &TaskRef) {
        info!(task = %task.id, file = %task.file_name, "Uploading file");
    }

    fn on_upload_failed(&self, task: &TaskRef, error: &UploadError) {
        warn!(task = %task.id, file = %task.file_name, error = %error, "Upload failed");
    }

    fn on_polling_started(&self, task: &TaskRef, problem_id: Option<&str>) {
        info!(
            task = %task.id,
            file = %task.file_name,
            problem_id = problem_id.unwrap_or("-"),
            "Submitted, waiting for result"
        );
    }

    fn on_ready(&self, task: &TaskRef, result: &ReadyResult) {
        info!(
            task = %task.id,
            file = %task.file_name,
            json_url = %result.json_url,
            image_url = %result.image_url,
            "File ready"
        );
    }

    fn on_poll_failed(&self, task: &TaskRef, error: &PollError) {
        warn!(task = %task.id, file = %task.file_name, error = %error, "Waiting for result failed");
    }

    fn on_busy_changed(&self, busy: bool) {
        info!(busy, "Busy state changed");
    }
}
