//! HTTP implementation of the Remote Job Service.

use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use tokio::io::{AsyncRead, ReadBuf};
use tracing::debug;

use clipkit_models::{DownloadUrlsResponse, Job, JobId, StackId, UploadTarget};

use crate::config::HttpConfig;
use crate::error::{ClientError, ClientResult};
use crate::service::{JobStatusSnapshot, ProgressFn, RemoteJobService};

/// Client for the ClipKit API.
pub struct HttpJobService {
    http: Client,
    config: HttpConfig,
}

impl HttpJobService {
    /// Create a new service client.
    pub fn new(config: HttpConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(HttpConfig::from_env())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Map a non-2xx response to `RequestFailed` carrying status and body.
async fn check(response: Response) -> ClientResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::RequestFailed(format!(
        "service returned {}: {}",
        status, body
    )))
}

#[derive(Serialize)]
struct UploadTargetRequest<'a> {
    file_name: &'a str,
    content_type: &'a str,
}

#[derive(Serialize)]
struct CreateJobRequest<'a> {
    video_url: &'a str,
    stack: &'a StackId,
}

#[async_trait]
impl RemoteJobService for HttpJobService {
    async fn upload_target(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> ClientResult<UploadTarget> {
        let url = self.url("/api/videos/upload-url");
        debug!(file_name, "requesting upload target");

        let response = self
            .authorize(self.http.post(&url))
            .json(&UploadTargetRequest {
                file_name,
                content_type,
            })
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    async fn transfer_payload(
        &self,
        upload_url: &str,
        local_path: &Path,
        content_type: &str,
        on_progress: ProgressFn,
    ) -> ClientResult<()> {
        let file = tokio::fs::File::open(local_path).await?;
        let total = file.metadata().await?.len();

        debug!(path = %local_path.display(), total, "transferring payload");

        let body = reqwest::Body::wrap_stream(ProgressBody {
            file,
            total,
            sent: 0,
            on_progress,
        });

        // The upload URL is presigned; no auth header.
        let response = self
            .http
            .put(upload_url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total)
            .body(body)
            .timeout(self.config.upload_timeout)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    async fn create_job(&self, public_url: &str, stack: &StackId) -> ClientResult<Job> {
        let url = self.url("/api/jobs");
        debug!(stack = %stack, "creating job");

        let response = self
            .authorize(self.http.post(&url))
            .json(&CreateJobRequest {
                video_url: public_url,
                stack,
            })
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    async fn job_status(&self, id: &JobId) -> ClientResult<JobStatusSnapshot> {
        let url = self.url(&format!("/api/jobs/{}/status", id));
        let response = self.authorize(self.http.get(&url)).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn fetch_job(&self, id: &JobId) -> ClientResult<Job> {
        let url = self.url(&format!("/api/jobs/{}", id));
        let response = self.authorize(self.http.get(&url)).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn fetch_results(&self, id: &JobId) -> ClientResult<DownloadUrlsResponse> {
        let url = self.url(&format!("/api/jobs/{}/results", id));
        let response = self.authorize(self.http.get(&url)).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn cancel_job(&self, id: &JobId) -> ClientResult<()> {
        let url = self.url(&format!("/api/jobs/{}/cancel", id));
        let response = self.authorize(self.http.post(&url)).send().await?;
        check(response).await?;
        Ok(())
    }
}

/// Request body that reports how much of the file has been handed to the
/// transport.
struct ProgressBody {
    file: tokio::fs::File,
    total: u64,
    sent: u64,
    on_progress: ProgressFn,
}

impl Stream for ProgressBody {
    type Item = std::io::Result<Vec<u8>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let me = self.get_mut();
        let mut buf = [0u8; 64 * 1024];
        let mut read_buf = ReadBuf::new(&mut buf);

        match Pin::new(&mut me.file).poll_read(cx, &mut read_buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
            Poll::Ready(Ok(())) => {
                let chunk = read_buf.filled();
                if chunk.is_empty() {
                    return Poll::Ready(None);
                }
                me.sent += chunk.len() as u64;
                if me.total > 0 {
                    (me.on_progress)((me.sent as f32 / me.total as f32).min(1.0));
                }
                Poll::Ready(Some(Ok(chunk.to_vec())))
            }
        }
    }
}
