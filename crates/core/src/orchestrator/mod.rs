//! Upload orchestration.
//!
//! The orchestrator takes a batch of candidate files and runs each valid one
//! through its lifecycle as an independent task:
//! - **Validation**: synchronous, in declaration order, no network access
//! - **Upload**: one request per file, never retried
//! - **Polling**: bounded by the configured [`PollSchedule`](crate::poller::PollSchedule)
//!
//! Progress is reported through a [`Presenter`]. One [`InFlightCounter`] per
//! orchestrator drives the busy indicator across all batches.

mod counter;
mod presenter;
mod runner;
mod types;

pub use counter::{InFlightCounter, InFlightGuard};
pub use presenter::{Presenter, TracingPresenter};
pub use runner::{BatchHandle, UploadOrchestrator};
pub use types::{TaskId, TaskRef, TaskReport, TaskState};
