//! Inference boundary for the analytics pipeline.
//!
//! The pipeline never talks to a model directly; it talks to the three
//! traits in this crate. [`StubSource`] is the randomized demo
//! implementation shipped today, [`FixtureSource`] is the deterministic
//! scripted implementation the tests drive. A real model backend slots in
//! by implementing the same traits.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use vigil_core::bbox::BBox;

mod fixture;
mod stub;

pub use fixture::FixtureSource;
pub use stub::StubSource;

/// Error type for inference operations.
#[derive(Debug, thiserror::Error)]
pub enum MlError {
    #[error("frame image not found: {0}")]
    FrameNotFound(PathBuf),

    #[error("inference failed: {0}")]
    Inference(String),
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// A sampled frame, already extracted to disk by the pipeline.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Zero-based frame index within the source video.
    pub index: i64,
    pub width: i32,
    pub height: i32,
    pub image_path: PathBuf,
}

/// A candidate person detection, in raw (unclamped) frame coordinates.
#[derive(Debug, Clone)]
pub struct DetectionCandidate {
    pub bbox: BBox,
    pub confidence: f64,
}

/// Per-crop attribute prediction. Every component is optional; a model
/// that cannot commit to a dimension leaves it unset rather than
/// guessing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AttributePrediction {
    pub upper_color: Option<String>,
    pub upper_color_confidence: Option<f64>,
    pub lower_color: Option<String>,
    pub lower_color_confidence: Option<f64>,
    pub gender: Option<String>,
    pub gender_confidence: Option<f64>,
}

/// A rectangular region-of-interest mask over a frame.
#[derive(Debug, Clone)]
pub struct RegionMask {
    pub frame_width: i32,
    pub frame_height: i32,
    pub region: BBox,
}

impl RegionMask {
    /// Percentage of the frame excluded by the mask. Feeds the
    /// area-reduction performance metric.
    pub fn area_reduction_pct(&self) -> f64 {
        let total = self.frame_width as i64 * self.frame_height as i64;
        if total <= 0 {
            return 0.0;
        }
        let kept = self.region.area().min(total);
        ((total - kept) as f64 / total as f64) * 100.0
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Person detection over a sampled frame.
///
/// An empty candidate list is a valid result (nobody in frame), not an
/// error.
#[async_trait]
pub trait Detector: Send + Sync {
    async fn detect(&self, frame: &Frame) -> Result<Vec<DetectionCandidate>, MlError>;
}

/// Attribute classification over a persisted person crop.
#[async_trait]
pub trait AttributeClassifier: Send + Sync {
    async fn classify(&self, crop: &Path) -> Result<AttributePrediction, MlError>;
}

/// Region-of-interest segmentation over a sampled frame.
#[async_trait]
pub trait Segmenter: Send + Sync {
    async fn generate_mask(&self, frame: &Frame) -> Result<RegionMask, MlError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
