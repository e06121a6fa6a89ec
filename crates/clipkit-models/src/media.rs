//! Local media descriptors and transfer types.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A locally selected media file waiting to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMedia {
    /// Path to the file on the local filesystem
    pub path: PathBuf,
    /// Display filename, if known
    pub file_name: Option<String>,
    /// MIME content type, if known
    pub content_type: Option<String>,
}

impl LocalMedia {
    /// Create a descriptor for a local file, inferring the filename
    /// from the path when possible.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string());
        Self {
            path,
            file_name,
            content_type: None,
        }
    }

    /// Set the display filename.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Set the MIME content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Credentials for a single payload upload, issued by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    /// Presigned URL the payload bytes are PUT to
    pub upload_url: String,
    /// Public URL the uploaded object will be reachable at
    pub public_url: String,
    /// Storage key of the object, if the service exposes it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// A single downloadable result file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadUrl {
    /// Filename
    pub name: String,
    /// Direct download URL
    pub url: String,
    /// MIME content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// File size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// Downloadable results manifest for a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadUrlsResponse {
    /// Job the results belong to
    pub job_id: String,
    /// Result files
    #[serde(default)]
    pub urls: Vec<DownloadUrl>,
}
