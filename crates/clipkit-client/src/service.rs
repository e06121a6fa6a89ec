//! The Remote Job Service boundary.
//!
//! Everything the orchestrator needs from the network sits behind
//! [`RemoteJobService`], so the pipeline can be driven against the real HTTP
//! implementation or a mock interchangeably.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use clipkit_models::{DownloadUrlsResponse, Job, JobId, JobProgress, JobStatus, StackId, UploadTarget};

use crate::error::ClientResult;

/// Callback invoked with the transfer progress fraction (0.0-1.0).
///
/// May be called zero or more times; implementations must tolerate it being
/// dropped without ever firing.
pub type ProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

/// Point-in-time status of a remote job, as returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusSnapshot {
    /// Current status
    pub status: JobStatus,
    /// Progress detail, if the service reports any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<JobProgress>,
}

impl JobStatusSnapshot {
    /// Progress percentage, defaulting to 0 when the service reports none.
    pub fn percentage(&self) -> u8 {
        self.progress.as_ref().map(|p| p.percentage).unwrap_or(0)
    }

    /// Human-readable step label: the service-provided message when present,
    /// otherwise the capitalized status code.
    pub fn step_label(&self) -> String {
        self.progress
            .as_ref()
            .and_then(|p| p.message.clone())
            .unwrap_or_else(|| self.status.display_name().to_string())
    }
}

/// Contract of the remote service driving credentialed upload, job lifecycle,
/// and result retrieval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteJobService: Send + Sync {
    /// Request credentials for a single payload upload.
    async fn upload_target(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> ClientResult<UploadTarget>;

    /// Transfer the payload bytes to the issued upload URL.
    async fn transfer_payload(
        &self,
        upload_url: &str,
        local_path: &Path,
        content_type: &str,
        on_progress: ProgressFn,
    ) -> ClientResult<()>;

    /// Create a processing job for an already uploaded object.
    async fn create_job(&self, public_url: &str, stack: &StackId) -> ClientResult<Job>;

    /// Query the current status of a job.
    async fn job_status(&self, id: &JobId) -> ClientResult<JobStatusSnapshot>;

    /// Fetch the full job record.
    async fn fetch_job(&self, id: &JobId) -> ClientResult<Job>;

    /// Fetch the downloadable-results manifest for a completed job.
    async fn fetch_results(&self, id: &JobId) -> ClientResult<DownloadUrlsResponse>;

    /// Request cancellation of a job. Callers treat this as best-effort and
    /// ignore failures.
    async fn cancel_job(&self, id: &JobId) -> ClientResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_defaults() {
        let snapshot = JobStatusSnapshot {
            status: JobStatus::Extracting,
            progress: None,
        };
        assert_eq!(snapshot.percentage(), 0);
        assert_eq!(snapshot.step_label(), "Extracting");
    }

    #[test]
    fn test_snapshot_prefers_service_message() {
        let snapshot = JobStatusSnapshot {
            status: JobStatus::Rendering,
            progress: Some(JobProgress {
                percentage: 60,
                message: Some("Rendering clip 3 of 5".to_string()),
            }),
        };
        assert_eq!(snapshot.percentage(), 60);
        assert_eq!(snapshot.step_label(), "Rendering clip 3 of 5");
    }

    #[test]
    fn test_snapshot_wire_format() {
        let snapshot: JobStatusSnapshot = serde_json::from_str(
            r#"{"status": "analyzing", "progress": {"percentage": 35}}"#,
        )
        .unwrap();
        assert_eq!(snapshot.status, JobStatus::Analyzing);
        assert_eq!(snapshot.percentage(), 35);
        assert_eq!(snapshot.step_label(), "Analyzing");
    }
}
