//! In-process job registry: at most one processing run per video.
//!
//! Job state is transient. The registry holds each run's progress
//! receiver, cancellation token, and owned join handle; once a run is
//! cleared, callers fall back to the persisted video and metric rows.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vigil_core::types::DbId;

use crate::progress::{self, ProgressUpdate};

/// Error returned when a video already has an in-flight run.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("video {0} is already being processed")]
    AlreadyRunning(DbId),
}

/// Handed to the spawned run: the progress sender and the token the run
/// must observe between frames.
pub struct JobGuard {
    pub video_id: DbId,
    pub progress: watch::Sender<ProgressUpdate>,
    pub cancel: CancellationToken,
}

struct JobEntry {
    progress: watch::Receiver<ProgressUpdate>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

/// Registry of in-flight processing runs.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<DbId, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<DbId, JobEntry>> {
        // Lock poisoning cannot happen: no closure under the lock panics.
        self.jobs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reserve the video's run slot. Concurrent submissions race on the
    /// map insert under one mutex; exactly one wins.
    pub fn submit(&self, video_id: DbId) -> Result<JobGuard, SubmitError> {
        let mut jobs = self.lock();
        if jobs.contains_key(&video_id) {
            return Err(SubmitError::AlreadyRunning(video_id));
        }

        let (tx, rx) = progress::channel(video_id);
        let cancel = CancellationToken::new();
        jobs.insert(
            video_id,
            JobEntry {
                progress: rx,
                cancel: cancel.clone(),
                handle: None,
            },
        );
        Ok(JobGuard {
            video_id,
            progress: tx,
            cancel,
        })
    }

    /// Attach the spawned run's handle so it stays owned and awaitable.
    pub fn attach(&self, video_id: DbId, handle: JoinHandle<()>) {
        if let Some(entry) = self.lock().get_mut(&video_id) {
            entry.handle = Some(handle);
        }
    }

    /// Latest progress snapshot of an in-flight run.
    pub fn status(&self, video_id: DbId) -> Option<ProgressUpdate> {
        self.lock()
            .get(&video_id)
            .map(|entry| entry.progress.borrow().clone())
    }

    pub fn is_running(&self, video_id: DbId) -> bool {
        self.lock().contains_key(&video_id)
    }

    /// Trigger the run's cancellation token. Returns whether a run was
    /// found; the run itself transitions the video to `cancelled`.
    pub fn cancel(&self, video_id: DbId) -> bool {
        match self.lock().get(&video_id) {
            Some(entry) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Remove a run's entry, returning the join handle (if one was
    /// attached) so the caller can await the run's shutdown.
    pub fn clear(&self, video_id: DbId) -> Option<JoinHandle<()>> {
        self.lock().remove(&video_id).and_then(|entry| entry.handle)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
