//! User-selected files.

use std::fmt;
use std::path::Path;

/// One file selected for upload.
///
/// Immutable once created: the size is derived from the content and never
/// changes afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct FileCandidate {
    name: String,
    media_type: String,
    content: Vec<u8>,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            content,
        }
    }

    /// Create a candidate whose media type is guessed from the file name.
    pub fn from_name(name: impl Into<String>, content: Vec<u8>) -> Self {
        let name = name.into();
        let media_type = guess_media_type(&name).to_string();
        Self::new(name, media_type, content)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared media type (may be empty when unknown).
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

// Content is left out on purpose: files can be megabytes.
impl fmt::Debug for FileCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileCandidate")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size", &self.size())
            .finish()
    }
}

/// Guess a media type from a file name's extension.
pub fn guess_media_type(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => "application/json",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}
