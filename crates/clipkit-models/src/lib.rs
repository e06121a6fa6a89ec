//! Shared data models for the ClipKit client SDK.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs, job status, and processing stacks
//! - The observable upload state machine
//! - Local media descriptors and upload/download transfer types

pub mod job;
pub mod media;
pub mod state;

// Re-export common types
pub use job::{Job, JobId, JobProgress, JobStatus, JobStatusParseError, StackId};
pub use media::{DownloadUrl, DownloadUrlsResponse, LocalMedia, UploadTarget};
pub use state::UploadState;
