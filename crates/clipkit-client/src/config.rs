//! Client configuration.

use std::time::Duration;

/// Configuration for the upload/process orchestrator.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Interval between job status polls
    pub poll_interval: Duration,
    /// Max status polls before the job is considered timed out
    pub max_poll_attempts: u32,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_poll_attempts: 150, // 5 minutes at the default interval
        }
    }
}

impl UploaderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            poll_interval: Duration::from_millis(
                std::env::var("CLIPKIT_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
            max_poll_attempts: std::env::var("CLIPKIT_MAX_POLL_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(150),
        }
    }
}

/// Configuration for the HTTP service client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL of the ClipKit API
    pub base_url: String,
    /// Bearer token sent with every API request
    pub auth_token: Option<String>,
    /// Timeout for JSON API requests
    pub timeout: Duration,
    /// Timeout for the payload transfer request
    pub upload_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            auth_token: None,
            timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(3600), // large files on slow links
        }
    }
}

impl HttpConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("CLIPKIT_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            auth_token: std::env::var("CLIPKIT_API_TOKEN").ok(),
            timeout: Duration::from_secs(
                std::env::var("CLIPKIT_HTTP_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            upload_timeout: Duration::from_secs(
                std::env::var("CLIPKIT_UPLOAD_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
        }
    }
}
