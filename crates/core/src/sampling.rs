//! Frame sampling for the analysis pipeline.
//!
//! The pipeline never runs inference on every frame; it samples at a fixed
//! target rate so inference cost is bounded by video duration, not frame
//! rate. Interval math lives here so the orchestrator and its tests share
//! one definition.

use crate::error::CoreError;

/// Target number of analyzed frames per second of video.
pub const TARGET_SAMPLES_PER_SEC: f64 = 2.0;

/// Compute the frame sampling interval for a video.
///
/// Returns `max(1, round(fps / target_rate))`. A non-positive or
/// non-finite fps is rejected: the interval feeds seek math, and guessing
/// a frame rate there would silently skip or duplicate frames.
pub fn sampling_interval(fps: f64, target_rate: f64) -> Result<u32, CoreError> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(CoreError::Validation(format!(
            "Cannot compute sampling interval for fps {fps}"
        )));
    }
    if !target_rate.is_finite() || target_rate <= 0.0 {
        return Err(CoreError::Validation(format!(
            "Invalid target sampling rate {target_rate}"
        )));
    }
    Ok(((fps / target_rate).round() as u32).max(1))
}

/// Iterator over the sampled frame indices of a video.
///
/// Indices are strictly increasing, start at 0, and are spaced by exactly
/// `interval` frames.
pub fn sampled_frames(total_frames: i64, interval: u32) -> impl Iterator<Item = i64> {
    let step = i64::from(interval.max(1));
    (0..total_frames.max(0)).step_by(step as usize)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
