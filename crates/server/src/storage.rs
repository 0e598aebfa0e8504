//! Local blob storage.
//!
//! Each bucket is a directory under the storage root. Blob names are flat:
//! anything that could escape the bucket directory is rejected.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex_lite::Regex;
use thiserror::Error;
use tracing::debug;

use bookopt_core::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid blob name: {0}")]
    InvalidName(String),

    #[error("Unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("Blob not found: {bucket}/{name}")]
    NotFound { bucket: String, name: String },

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    json_bucket: String,
    optimized_bucket: String,
    plotted_bucket: String,
}

impl BlobStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.root.clone(),
            json_bucket: config.json_bucket.clone(),
            optimized_bucket: config.optimized_bucket.clone(),
            plotted_bucket: config.plotted_bucket.clone(),
        }
    }

    /// Bucket holding accepted uploads.
    pub fn json_bucket(&self) -> &str {
        &self.json_bucket
    }

    /// Bucket the optimizer writes its output documents to.
    pub fn optimized_bucket(&self) -> &str {
        &self.optimized_bucket
    }

    /// Bucket the plotter writes its images to.
    pub fn plotted_bucket(&self) -> &str {
        &self.plotted_bucket
    }

    pub fn is_known_bucket(&self, bucket: &str) -> bool {
        bucket == self.json_bucket || bucket == self.optimized_bucket || bucket == self.plotted_bucket
    }

    /// Filesystem path of a blob.
    pub fn blob_path(&self, bucket: &str, name: &str) -> Result<PathBuf, StorageError> {
        if !self.is_known_bucket(bucket) {
            return Err(StorageError::UnknownBucket(bucket.to_string()));
        }
        validate_blob_name(name)?;
        Ok(self.root.join(bucket).join(name))
    }

    pub async fn put(&self, bucket: &str, name: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.blob_path(bucket, name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        debug!(bucket, name, size = data.len(), "Stored blob");
        Ok(())
    }

    pub async fn get(&self, bucket: &str, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.blob_path(bucket, name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, bucket: &str, name: &str) -> Result<bool, StorageError> {
        let path = self.blob_path(bucket, name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

/// Reject names that are empty or could leave the bucket directory.
///
/// Buckets are flat, so a name is safe once it is not a dot entry and has
/// no separators.
pub fn validate_blob_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("fileName must end with .json")]
    NotJson,

    #[error("Invalid fileName format: {0}. Expected 'basename_valid_GUID.json'.")]
    InvalidFormat(String),
}

/// Name of an accepted upload, `<base>_valid_<guid>.json`, from which the
/// names of its derived artifacts follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredName {
    base: String,
    guid: String,
}

impl StoredName {
    /// Name for a new upload of `original` (the client's file name).
    ///
    /// A `.json` extension is dropped from the base; any other extension is
    /// kept. The guid is the first 6 hex digits of a random UUID.
    pub fn generate(original: &str) -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        let original = if original.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            original.to_string()
        };
        let base = match split_extension(&original) {
            (stem, Some(ext)) if ext.eq_ignore_ascii_case(".json") => stem.to_string(),
            _ => original.clone(),
        };
        Self {
            base,
            guid: uuid[..6].to_string(),
        }
    }

    pub fn parse(file_name: &str) -> Result<Self, NameError> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();

        if !file_name.ends_with(".json") {
            return Err(NameError::NotJson);
        }
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"^(.*?)_valid_([a-zA-Z0-9]{6})\.json$").expect("valid regex")
        });
        let captures = pattern
            .captures(file_name)
            .ok_or_else(|| NameError::InvalidFormat(file_name.to_string()))?;

        Ok(Self {
            base: captures[1].to_string(),
            guid: captures[2].to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn upload_name(&self) -> String {
        format!("{}_valid_{}.json", self.base, self.guid)
    }

    pub fn optimized_name(&self) -> String {
        format!("{}_optimized_{}.json", self.base, self.guid)
    }

    pub fn plotted_name(&self) -> String {
        format!("{}_plotted_{}.png", self.base, self.guid)
    }
}

/// Split `name` into stem and extension (with its dot). Leading dots do not
/// start an extension.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    let body_start = name.len() - name.trim_start_matches('.').len();
    match name[body_start..].rfind('.') {
        Some(idx) => {
            let idx = body_start + idx;
            (&name[..idx], Some(&name[idx..]))
        }
        None => (name, None),
    }
}
