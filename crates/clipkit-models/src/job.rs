//! Job definitions for the remote processing pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unique identifier for a remote job.
///
/// Job IDs are assigned by the service; the client treats them as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the ID has been assigned yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of the processing stack a job runs through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackId(pub String);

impl StackId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StackId {
    fn default() -> Self {
        Self("default".to_string())
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is queued waiting for a worker
    #[default]
    Pending,
    /// Source media is being extracted
    Extracting,
    /// Audio is being transcribed
    Transcribing,
    /// Content analysis is running
    Analyzing,
    /// Output clips are being rendered
    Rendering,
    /// Results are being uploaded to storage
    Uploading,
    /// Job completed successfully
    Completed,
    /// Job failed with an error
    Failed,
    /// Job was cancelled
    Cancelled,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Extracting => "extracting",
            JobStatus::Transcribing => "transcribing",
            JobStatus::Analyzing => "analyzing",
            JobStatus::Rendering => "rendering",
            JobStatus::Uploading => "uploading",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Capitalized form of the raw status code, used as a fallback
    /// step label when the service provides no progress message.
    pub fn display_name(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Extracting => "Extracting",
            JobStatus::Transcribing => "Transcribing",
            JobStatus::Analyzing => "Analyzing",
            JobStatus::Rendering => "Rendering",
            JobStatus::Uploading => "Uploading",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
            JobStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = JobStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "extracting" => Ok(JobStatus::Extracting),
            "transcribing" => Ok(JobStatus::Transcribing),
            "analyzing" => Ok(JobStatus::Analyzing),
            "rendering" => Ok(JobStatus::Rendering),
            "uploading" => Ok(JobStatus::Uploading),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            _ => Err(JobStatusParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown job status: {0}")]
pub struct JobStatusParseError(String);

/// Progress detail reported alongside a job status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct JobProgress {
    /// Progress percentage (0-100)
    #[serde(default)]
    pub percentage: u8,
    /// Human-readable description of the current step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A remote processing job.
///
/// Owned by the service; the client only ever holds a transient copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Current status
    #[serde(default)]
    pub status: JobStatus,

    /// Public URL of the source video
    pub source_url: String,

    /// Progress (0-100)
    #[serde(default)]
    pub progress: u8,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
