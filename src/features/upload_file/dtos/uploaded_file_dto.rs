use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::features::upload_file::constants::DEFAULT_CONTENT_TYPE;

/// Temporary file handed over by the upload feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Local path of the temporary file
    pub path: PathBuf,
    /// Original filename as uploaded
    #[serde(default)]
    pub name: Option<String>,
    /// Size of the file in bytes
    #[serde(default)]
    pub size: Option<u64>,
    /// MIME type of the file
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
}

impl UploadedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name: None,
            size: None,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// MIME type sent to the store, `application/octet-stream` when unknown
    pub fn content_type_or_default(&self) -> &str {
        self.content_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}
