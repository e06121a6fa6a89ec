//! Upload/process orchestrator.
//!
//! [`Uploader`] owns the full client-side lifecycle: acquire upload
//! credentials, transfer the payload, create the remote job, poll it to a
//! terminal status, and fetch the results. The current phase is published
//! through a `tokio::sync::watch` channel as one [`UploadState`] value.
//!
//! Cancellation is cooperative. Every operation captures a generation token
//! at `start()`; `cancel()`, `reset()`, a newer `start()`, and drop all bump
//! the counter, so a stale continuation can never mutate the state of a
//! newer operation. In-flight network calls are not aborted at the transport
//! level; their effects are suppressed instead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use clipkit_models::{JobId, JobStatus, LocalMedia, StackId, UploadState};

use crate::config::UploaderConfig;
use crate::error::ClientError;
use crate::poll::{poll_until, PollConfig, PollOutcome, PollStep};
use crate::service::{ProgressFn, RemoteJobService};

const DEFAULT_FILE_NAME: &str = "video.mp4";
const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// Drives a local media file through the remote upload/process pipeline.
///
/// One instance drives at most one operation at a time; `start()` from any
/// state behaves as a restart. Must live inside a tokio runtime: `start()`
/// and `cancel()` spawn tasks.
pub struct Uploader {
    inner: Arc<Inner>,
    pipeline: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    service: Arc<dyn RemoteJobService>,
    config: UploaderConfig,
    state: watch::Sender<UploadState>,
    /// Live operation token; continuations compare their captured value.
    generation: AtomicU64,
    /// Job ID of the current operation, once creation succeeded.
    job_id: Mutex<Option<JobId>>,
    /// Interrupts the poll loop's idle wait on cancel/reset/restart.
    wake: Notify,
}

impl Uploader {
    /// Create an orchestrator over the given service.
    pub fn new(service: Arc<dyn RemoteJobService>, config: UploaderConfig) -> Self {
        let (state, _) = watch::channel(UploadState::Idle);
        Self {
            inner: Arc::new(Inner {
                service,
                config,
                state,
                generation: AtomicU64::new(0),
                job_id: Mutex::new(None),
                wake: Notify::new(),
            }),
            pipeline: Mutex::new(None),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> UploadState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.inner.state.subscribe()
    }

    /// Start uploading and processing a local media file.
    ///
    /// Callable from any state; a previous incomplete operation is
    /// invalidated (its continuations become inert) but any network call it
    /// already dispatched is left to resolve on its own. The transition to
    /// `Uploading { progress: 0.0 }` happens before this method returns.
    pub fn start(&self, media: LocalMedia, stack: Option<StackId>) {
        let generation = self.inner.bump_generation();
        *self.inner.lock_job_id() = None;
        self.inner
            .state
            .send_replace(UploadState::Uploading { progress: 0.0 });

        debug!(path = %media.path().display(), "starting upload pipeline");

        let weak = Arc::downgrade(&self.inner);
        let stack = stack.unwrap_or_default();
        let handle = tokio::spawn(run_pipeline(weak, generation, media, stack));

        // The previous task, if any, dies at its next generation check;
        // aborting it here would skip its best-effort cleanup tail.
        *self.lock_pipeline() = Some(handle);
    }

    /// Cancel the current operation.
    ///
    /// Invalidates every continuation, stops the poll timer, issues a
    /// best-effort remote cancel when a job ID has been recorded, and sets
    /// the state to `Cancelled`. Safe from any state; repeated calls leave
    /// the state `Cancelled`.
    pub fn cancel(&self) {
        self.inner.bump_generation();

        let job_id = self.inner.lock_job_id().clone();
        if let Some(id) = job_id {
            let service = Arc::clone(&self.inner.service);
            tokio::spawn(async move {
                if let Err(e) = service.cancel_job(&id).await {
                    warn!(job_id = %id, "best-effort job cancellation failed: {}", e);
                }
            });
        }

        self.inner.state.send_replace(UploadState::Cancelled);
    }

    /// Return to `Idle`, clearing the recorded job ID.
    ///
    /// Behaves as abandon-and-clear when an operation is in flight: already
    /// dispatched network calls resolve inertly. Because invalidation is a
    /// fresh generation rather than a shared flag, a later `start()` is
    /// never mistaken for a cancelled operation.
    pub fn reset(&self) {
        self.inner.bump_generation();
        *self.inner.lock_job_id() = None;
        self.inner.state.send_replace(UploadState::Idle);
    }

    fn lock_pipeline(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pipeline.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Uploader {
    fn drop(&mut self) {
        // Invalidate continuations first, then stop the live task so no
        // timer outlives the orchestrator.
        self.inner.bump_generation();
        if let Some(handle) = self.lock_pipeline().take() {
            handle.abort();
        }
    }
}

impl Inner {
    /// Mint a new generation and wake the poll loop. Returns the new value.
    fn bump_generation(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.wake.notify_waiters();
        generation
    }

    fn is_live(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Publish a state snapshot if `generation` is still the live one.
    ///
    /// The check runs inside the watch sender's critical section, so a stale
    /// continuation cannot overwrite a `Cancelled`/`Idle` written by a
    /// concurrent `cancel()`/`reset()`.
    fn set_state(&self, generation: u64, state: UploadState) -> bool {
        self.state.send_if_modified(|current| {
            if !self.is_live(generation) {
                return false;
            }
            *current = state;
            true
        })
    }

    fn fail(&self, generation: u64, message: String) {
        self.set_state(generation, UploadState::Error { message });
    }

    fn lock_job_id(&self) -> MutexGuard<'_, Option<JobId>> {
        self.job_id.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Flatten a pipeline failure to the message surfaced in `Error`.
///
/// A blank payload would render as a bare prefix ("Invalid response: "),
/// so it maps to "Unknown error" instead.
fn error_message(err: &ClientError) -> String {
    let blank = match err {
        ClientError::RequestFailed(detail) | ClientError::InvalidResponse(detail) => {
            detail.trim().is_empty()
        }
        _ => false,
    };
    if blank {
        "Unknown error".to_string()
    } else {
        err.to_string()
    }
}

/// The asynchronous tail of `start()`.
///
/// Holds only a `Weak` reference between phases: once the orchestrator is
/// dropped, every upgrade fails and the task exits without touching state.
async fn run_pipeline(weak: Weak<Inner>, generation: u64, media: LocalMedia, stack: StackId) {
    let file_name = media
        .file_name
        .clone()
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
    let content_type = media
        .content_type
        .clone()
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    // Phase 1: upload credentials.
    let target = {
        let Some(inner) = weak.upgrade() else { return };
        match inner.service.upload_target(&file_name, &content_type).await {
            Ok(target) => target,
            Err(e) => {
                inner.fail(generation, error_message(&e));
                return;
            }
        }
    };

    // Phase 2: payload transfer. The fixed 0.5 milestone marks credentials
    // acquired; the callback then reports real transfer progress.
    {
        let Some(inner) = weak.upgrade() else { return };
        if !inner.set_state(generation, UploadState::Uploading { progress: 0.5 }) {
            return;
        }

        let progress_weak = Weak::clone(&weak);
        let on_progress: ProgressFn = Arc::new(move |fraction: f32| {
            if let Some(inner) = progress_weak.upgrade() {
                inner.set_state(
                    generation,
                    UploadState::Uploading {
                        progress: fraction.clamp(0.0, 1.0),
                    },
                );
            }
        });

        if let Err(e) = inner
            .service
            .transfer_payload(&target.upload_url, media.path(), &content_type, on_progress)
            .await
        {
            inner.fail(generation, error_message(&e));
            return;
        }

        if !inner.set_state(
            generation,
            UploadState::Processing {
                job_id: String::new(),
                progress: 0,
                step: "Creating job...".to_string(),
            },
        ) {
            return;
        }
    }

    // Phase 3: job creation and polling.
    let Some(inner) = weak.upgrade() else { return };

    let job = match inner.service.create_job(&target.public_url, &stack).await {
        Ok(job) => job,
        Err(e) => {
            inner.fail(generation, error_message(&e));
            return;
        }
    };

    {
        // Record under the lock with a liveness re-check so a restart that
        // raced the creation response cannot inherit this job's ID.
        let mut slot = inner.lock_job_id();
        if inner.is_live(generation) {
            *slot = Some(job.id.clone());
        }
    }

    if !inner.is_live(generation) {
        // Cancelled or replaced while creation was in flight. The job now
        // exists server-side, so try to cancel it remotely.
        if let Err(e) = inner.service.cancel_job(&job.id).await {
            warn!(job_id = %job.id, "best-effort job cancellation failed: {}", e);
        }
        return;
    }

    if !inner.set_state(
        generation,
        UploadState::Processing {
            job_id: job.id.to_string(),
            progress: 0,
            step: "Starting...".to_string(),
        },
    ) {
        return;
    }

    let poll_config = PollConfig {
        interval: inner.config.poll_interval,
        max_attempts: inner.config.max_poll_attempts,
    };

    let outcome = poll_until(
        &poll_config,
        &inner.wake,
        || inner.is_live(generation),
        || {
            let inner = Arc::clone(&inner);
            let job_id = job.id.clone();
            async move {
                match inner.service.job_status(&job_id).await {
                    Ok(snapshot) => {
                        inner.set_state(
                            generation,
                            UploadState::Processing {
                                job_id: job_id.to_string(),
                                progress: snapshot.percentage().min(100),
                                step: snapshot.step_label(),
                            },
                        );
                        if snapshot.status.is_terminal() {
                            PollStep::Done(snapshot.status)
                        } else {
                            PollStep::Pending
                        }
                    }
                    Err(e) => {
                        debug!(job_id = %job_id, "transient status query failure: {}", e);
                        PollStep::Pending
                    }
                }
            }
        },
    )
    .await;

    match outcome {
        PollOutcome::Superseded => {}
        PollOutcome::TimedOut => {
            inner.fail(generation, "Job timed out".to_string());
        }
        PollOutcome::Terminal(JobStatus::Completed) => {
            match tokio::try_join!(
                inner.service.fetch_job(&job.id),
                inner.service.fetch_results(&job.id)
            ) {
                Ok((job, download_urls)) => {
                    inner.set_state(generation, UploadState::Completed { job, download_urls });
                }
                Err(e) => {
                    warn!(job_id = %job.id, "result fetch failed: {}", e);
                    inner.fail(generation, "Failed to fetch results".to_string());
                }
            }
        }
        PollOutcome::Terminal(status) => {
            inner.fail(generation, format!("Job {}", status.as_str()));
        }
    }
}
