//! Progress reporting for processing runs.
//!
//! Each run owns a `tokio::sync::watch` sender; observers only ever see
//! the latest value, and a slow or absent observer can never stall the
//! run.

use serde::Serialize;
use tokio::sync::watch;
use vigil_core::types::DbId;

/// A point-in-time snapshot of a processing run.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub video_id: DbId,
    pub status: String,
    /// Percentage in [0, 100], computed as (current_frame / total_frames) * 100.
    pub progress_pct: f64,
    pub current_frame: i64,
    pub total_frames: i64,
    pub detection_count: i64,
    pub message: Option<String>,
}

impl ProgressUpdate {
    pub fn starting(video_id: DbId) -> Self {
        Self {
            video_id,
            status: "processing".to_string(),
            progress_pct: 0.0,
            current_frame: 0,
            total_frames: 0,
            detection_count: 0,
            message: None,
        }
    }

    pub fn processing(
        video_id: DbId,
        current_frame: i64,
        total_frames: i64,
        detection_count: i64,
    ) -> Self {
        let pct = if total_frames > 0 {
            (current_frame as f64 / total_frames as f64) * 100.0
        } else {
            0.0
        };
        Self {
            video_id,
            status: "processing".to_string(),
            progress_pct: pct.clamp(0.0, 100.0),
            current_frame,
            total_frames,
            detection_count,
            message: None,
        }
    }

    pub fn completed(video_id: DbId, total_frames: i64, detection_count: i64) -> Self {
        Self {
            video_id,
            status: "completed".to_string(),
            progress_pct: 100.0,
            current_frame: total_frames,
            total_frames,
            detection_count,
            message: None,
        }
    }

    pub fn failed(video_id: DbId, message: impl Into<String>) -> Self {
        Self {
            video_id,
            status: "failed".to_string(),
            progress_pct: 0.0,
            current_frame: 0,
            total_frames: 0,
            detection_count: 0,
            message: Some(message.into()),
        }
    }

    pub fn cancelled(video_id: DbId, current_frame: i64, total_frames: i64) -> Self {
        Self {
            video_id,
            status: "cancelled".to_string(),
            progress_pct: if total_frames > 0 {
                (current_frame as f64 / total_frames as f64) * 100.0
            } else {
                0.0
            },
            current_frame,
            total_frames,
            detection_count: 0,
            message: None,
        }
    }
}

/// Create a progress channel primed with a starting snapshot.
pub fn channel(video_id: DbId) -> (watch::Sender<ProgressUpdate>, watch::Receiver<ProgressUpdate>) {
    watch::channel(ProgressUpdate::starting(video_id))
}

/// Fire-and-forget send: a closed channel (no registry entry, no
/// observers) is not an error for the run.
pub fn emit(sender: &watch::Sender<ProgressUpdate>, update: ProgressUpdate) {
    let _ = sender.send(update);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
