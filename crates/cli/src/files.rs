//! Reading files from disk into upload candidates.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bookopt_core::FileCandidate;

/// Read one file. The candidate is named after the last path component and
/// its media type is guessed from the extension.
pub async fn read_candidate(path: &Path) -> Result<FileCandidate> {
    let name = path
        .file_name()
        .with_context(|| format!("{} has no file name", path.display()))?
        .to_string_lossy()
        .into_owned();
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(FileCandidate::from_name(name, content))
}

/// Read every file, in order. Fails on the first unreadable path.
pub async fn read_candidates(paths: &[PathBuf]) -> Result<Vec<FileCandidate>> {
    let mut candidates = Vec::with_capacity(paths.len());
    for path in paths {
        candidates.push(read_candidate(path).await?);
    }
    Ok(candidates)
}
