//! Testing utilities and mock implementations.
//!
//! This module provides a mock [`Backend`](crate::backend::Backend) and a
//! recording [`Presenter`](crate::orchestrator::Presenter), allowing the
//! whole upload workflow to be exercised without a server.
//!
//! # Example
//!
//! ```rust,ignore
//! use bookopt_core::testing::{fixtures, MockBackend, RecordingPresenter};
//!
//! let backend = Arc::new(MockBackend::new());
//! let presenter = Arc::new(RecordingPresenter::new());
//!
//! // Configure mock responses
//! backend.set_result_sequence("a.json-token", vec![/* statuses */]).await;
//!
//! // Use in UploadOrchestrator...
//! ```

mod mock_backend;
mod recording_presenter;

pub use mock_backend::{MockBackend, RecordedQuery, RecordedUpload};
pub use recording_presenter::{PresenterEvent, RecordingPresenter};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::backend::{ReadyResult, UploadToken};
    use crate::file::FileCandidate;

    /// JSON document of exactly `size` bytes (at least 2).
    pub fn json_bytes(size: usize) -> Vec<u8> {
        let size = size.max(2);
        let mut bytes = Vec::with_capacity(size);
        bytes.push(b'{');
        bytes.resize(size - 1, b' ');
        bytes.push(b'}');
        bytes
    }

    /// File of `size` bytes whose media type is guessed from `name`.
    pub fn json_file(name: &str, size: usize) -> FileCandidate {
        FileCandidate::from_name(name, json_bytes(size))
    }

    /// File with an explicit media type.
    pub fn typed_file(name: &str, media_type: &str, size: usize) -> FileCandidate {
        FileCandidate::new(name, media_type, json_bytes(size))
    }

    /// Batch of `count` valid files named `file-{i}.json`.
    pub fn json_batch(count: usize, size: usize) -> Vec<FileCandidate> {
        (1..=count)
            .map(|i| json_file(&format!("file-{}.json", i), size))
            .collect()
    }

    /// Ready result with links derived from `token`.
    pub fn ready_result(token: &str) -> ReadyResult {
        ReadyResult {
            json_url: format!("/j/{}.json", token),
            image_url: format!("/i/{}.png", token),
            expires_in_minutes: Some(60),
            problem_id: None,
        }
    }

    pub fn token(value: &str, problem_id: Option<&str>) -> UploadToken {
        UploadToken::new(value, problem_id.map(str::to_string))
    }
}
