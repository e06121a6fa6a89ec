//! Client-side orchestration for the ClipKit upload/process pipeline.
//!
//! The entry point is [`Uploader`]: it takes a locally selected media file,
//! drives it through the remote pipeline (obtain upload credentials →
//! transfer bytes → create and poll a processing job → fetch results), and
//! exposes a single observable [`clipkit_models::UploadState`] value.
//!
//! All network access goes through the [`RemoteJobService`] trait;
//! [`HttpJobService`] is the production implementation.

pub mod config;
pub mod error;
pub mod http;
pub mod poll;
pub mod service;
pub mod uploader;

pub use config::{HttpConfig, UploaderConfig};
pub use error::{ClientError, ClientResult};
pub use http::HttpJobService;
pub use poll::{PollConfig, PollOutcome, PollStep};
pub use service::{JobStatusSnapshot, ProgressFn, RemoteJobService};
pub use uploader::Uploader;
