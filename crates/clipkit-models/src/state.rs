//! Observable state of the upload/process pipeline.
//!
//! Exactly one variant is active at a time. Transitions follow the path
//! `idle → uploading → processing → {completed|error|cancelled}`, with two
//! permitted jumps: a failure during upload or job creation goes straight to
//! `error`, and cancellation from any active phase goes straight to
//! `cancelled`.

use serde::{Deserialize, Serialize};

use crate::job::Job;
use crate::media::DownloadUrlsResponse;

/// Snapshot of the current pipeline phase, exposed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum UploadState {
    /// No operation in flight
    #[default]
    Idle,
    /// Payload transfer phase
    Uploading {
        /// Transfer progress fraction (0.0-1.0)
        progress: f32,
    },
    /// Server-side job active
    Processing {
        /// Remote job ID; empty only between the job-creation request
        /// and its response
        job_id: String,
        /// Job progress percentage (0-100)
        progress: u8,
        /// Human-readable description of the current step
        step: String,
    },
    /// Terminal: job finished and results were fetched
    Completed {
        job: Job,
        download_urls: DownloadUrlsResponse,
    },
    /// Terminal: the pipeline failed
    Error { message: String },
    /// Terminal: user-initiated abort
    Cancelled,
}

impl UploadState {
    /// Check if this is a terminal state (no further automatic transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadState::Completed { .. } | UploadState::Error { .. } | UploadState::Cancelled
        )
    }

    /// Check if an operation is in flight.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            UploadState::Uploading { .. } | UploadState::Processing { .. }
        )
    }

    /// Get string representation of the phase.
    pub fn phase_str(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::Uploading { .. } => "uploading",
            UploadState::Processing { .. } => "processing",
            UploadState::Completed { .. } => "completed",
            UploadState::Error { .. } => "error",
            UploadState::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(UploadState::default(), UploadState::Idle);
        assert!(!UploadState::Idle.is_terminal());
        assert!(!UploadState::Idle.is_active());
    }

    #[test]
    fn test_phase_classification() {
        assert!(UploadState::Uploading { progress: 0.5 }.is_active());
        assert!(UploadState::Processing {
            job_id: "job-1".into(),
            progress: 10,
            step: "Rendering".into(),
        }
        .is_active());
        assert!(UploadState::Cancelled.is_terminal());
        assert!(UploadState::Error {
            message: "boom".into()
        }
        .is_terminal());
    }

    #[test]
    fn test_tagged_serialization() {
        let state = UploadState::Processing {
            job_id: "job-9".into(),
            progress: 42,
            step: "Analyzing".into(),
        };
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["phase"], "processing");
        assert_eq!(value["job_id"], "job-9");
        assert_eq!(value["progress"], 42);

        let idle = serde_json::to_value(UploadState::Idle).unwrap();
        assert_eq!(idle["phase"], "idle");
    }
}
