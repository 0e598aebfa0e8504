pub mod backend;
pub mod config;
pub mod file;
pub mod orchestrator;
pub mod poller;
pub mod testing;
pub mod uploader;
pub mod validator;

pub use backend::{Backend, BackendError, HttpBackend, ReadyResult, ResultStatus, UploadToken};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
    SanitizedConfig,
};
pub use file::FileCandidate;
pub use orchestrator::{
    BatchHandle, InFlightCounter, Presenter, TaskId, TaskRef, TaskReport, TaskState,
    TracingPresenter, UploadOrchestrator,
};
pub use poller::{PollError, PollSchedule, Poller};
pub use uploader::{UploadError, Uploader};
pub use validator::{Limits, ValidationError, Validator};
