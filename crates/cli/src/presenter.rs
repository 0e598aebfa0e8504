//! Terminal rendering of upload progress.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use bookopt_core::{
    PollError, Presenter, ReadyResult, TaskRef, UploadError, ValidationError,
};

const MIB: f64 = 1024.0 * 1024.0;

/// Writes one line per event, prefixed with the task id.
pub struct TerminalPresenter<W: Write + Send> {
    out: Mutex<W>,
}

impl TerminalPresenter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn line(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // Nothing sensible to do if the terminal is gone.
        let _ = writeln!(out, "{}", text);
        let _ = out.flush();
    }

    fn task_line(&self, task: &TaskRef, text: &str) {
        self.line(&format!("{} {}", task.id, text));
    }
}

fn rejection_message(file_name: &str, reason: &ValidationError) -> String {
    match reason {
        ValidationError::UnsupportedType {
            expected_extension, ..
        } => format!(
            "Unsupported file type for {}. Please choose {} files.",
            file_name, expected_extension
        ),
        ValidationError::TooLarge { max, .. } => format!(
            "File {} too large. Maximum is {:.1} MB.",
            file_name,
            *max as f64 / MIB
        ),
        other => format!("Error for {}: {}", file_name, other),
    }
}

impl<W: Write + Send> Presenter for TerminalPresenter<W> {
    fn on_batch_rejected(&self, reason: &ValidationError) {
        let text = match reason {
            ValidationError::NoFiles => "Please select one or more files.".to_string(),
            ValidationError::TooManyFiles { max, .. } => format!(
                "You can only upload a maximum of {} files at a time.",
                max
            ),
            other => other.to_string(),
        };
        self.line(&text);
    }

    fn on_task_created(&self, task: &TaskRef) {
        self.task_line(task, &format!("Validating {}...", task.file_name));
    }

    fn on_validation_rejected(&self, task: &TaskRef, reason: &ValidationError) {
        self.task_line(task, &rejection_message(&task.file_name, reason));
    }

    fn on_upload_started(&self, task: &TaskRef) {
        self.task_line(task, &format!("Uploading {}...", task.file_name));
    }

    fn on_upload_failed(&self, task: &TaskRef, error: &UploadError) {
        self.task_line(
            task,
            &format!("Error for {}: {}", task.file_name, error.detail()),
        );
    }

    fn on_polling_started(&self, task: &TaskRef, problem_id: Option<&str>) {
        let text = match problem_id {
            Some(id) => format!(
                "ProblemID {} ({}) submitted. Processing...",
                id, task.file_name
            ),
            None => format!("{} submitted. Processing...", task.file_name),
        };
        self.task_line(task, &text);
    }

    fn on_ready(&self, task: &TaskRef, result: &ReadyResult) {
        self.task_line(task, &format!("File ready: {}", task.file_name));
        self.task_line(task, &format!("  Optimized JSON: {}", result.json_url));
        self.task_line(task, &format!("  Plot (PNG): {}", result.image_url));
    }

    fn on_poll_failed(&self, task: &TaskRef, error: &PollError) {
        self.task_line(
            task,
            &format!("Error for {}: {}", task.file_name, error.detail()),
        );
    }

    fn on_busy_changed(&self, busy: bool) {
        if !busy {
            self.line("All files finished.");
        }
    }
}
