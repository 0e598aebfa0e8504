//! Pre-upload checks on batches and individual files.

use thiserror::Error;

use crate::config::{
    LimitsConfig, DEFAULT_ALLOWED_EXTENSION, DEFAULT_ALLOWED_MEDIA_TYPE, DEFAULT_MAX_FILES_PER_BATCH,
    DEFAULT_MAX_FILE_SIZE,
};
use crate::file::FileCandidate;

/// Why a batch or a file was refused before upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no files selected")]
    NoFiles,

    #[error("too many files: {count} selected, maximum is {max}")]
    TooManyFiles { count: usize, max: usize },

    #[error("unsupported type: expected {expected_extension} or {expected_media_type}, got {media_type:?}")]
    UnsupportedType {
        media_type: String,
        expected_extension: String,
        expected_media_type: String,
    },

    #[error("too large: {size} bytes exceeds maximum of {max} bytes")]
    TooLarge { size: u64, max: u64 },
}

impl ValidationError {
    /// Short machine-friendly reason.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::NoFiles => "no files",
            ValidationError::TooManyFiles { .. } => "too many files",
            ValidationError::UnsupportedType { .. } => "unsupported type",
            ValidationError::TooLarge { .. } => "too large",
        }
    }
}

/// Limits enforced by the [`Validator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    pub max_file_size: u64,
    pub max_files_per_batch: usize,
    pub allowed_extension: String,
    pub allowed_media_type: String,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_files_per_batch: DEFAULT_MAX_FILES_PER_BATCH,
            allowed_extension: DEFAULT_ALLOWED_EXTENSION.to_string(),
            allowed_media_type: DEFAULT_ALLOWED_MEDIA_TYPE.to_string(),
        }
    }
}

impl From<&LimitsConfig> for Limits {
    fn from(config: &LimitsConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            max_files_per_batch: config.max_files_per_batch,
            allowed_extension: config.allowed_extension.clone(),
            allowed_media_type: config.allowed_media_type.clone(),
        }
    }
}

/// Pure predicate over batches and files.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    limits: Limits,
}

impl Validator {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Check the batch as a whole. Runs before any per-file check.
    pub fn check_batch(&self, count: usize) -> Result<(), ValidationError> {
        if count == 0 {
            return Err(ValidationError::NoFiles);
        }
        if count > self.limits.max_files_per_batch {
            return Err(ValidationError::TooManyFiles {
                count,
                max: self.limits.max_files_per_batch,
            });
        }
        Ok(())
    }

    /// Check a single file: type first, then size.
    pub fn validate(&self, file: &FileCandidate) -> Result<(), ValidationError> {
        let type_ok = file.media_type() == self.limits.allowed_media_type
            || file
                .name()
                .to_lowercase()
                .ends_with(&self.limits.allowed_extension.to_lowercase());

        if !type_ok {
            return Err(ValidationError::UnsupportedType {
                media_type: file.media_type().to_string(),
                expected_extension: self.limits.allowed_extension.clone(),
                expected_media_type: self.limits.allowed_media_type.clone(),
            });
        }

        if file.size() > self.limits.max_file_size {
            return Err(ValidationError::TooLarge {
                size: file.size(),
                max: self.limits.max_file_size,
            });
        }

        Ok(())
    }
}
