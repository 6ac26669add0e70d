//! Deterministic scripted implementation of the inference boundary.
//!
//! Tests script exactly which candidates each frame yields and which
//! prediction every crop gets, so pipeline behavior can be asserted
//! row-for-row.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use vigil_core::bbox::BBox;

use crate::{
    AttributeClassifier, AttributePrediction, DetectionCandidate, Detector, Frame, MlError,
    RegionMask, Segmenter,
};

/// Scripted attribute source keyed by frame index.
#[derive(Default)]
pub struct FixtureSource {
    candidates: HashMap<i64, Vec<DetectionCandidate>>,
    prediction: AttributePrediction,
    fail_frames: Vec<i64>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the candidates returned for a frame index. Unscripted
    /// frames yield no candidates.
    pub fn with_frame(mut self, index: i64, candidates: Vec<DetectionCandidate>) -> Self {
        self.candidates.insert(index, candidates);
        self
    }

    /// Convenience: one candidate with the given box and confidence.
    pub fn with_single(self, index: i64, bbox: BBox, confidence: f64) -> Self {
        self.with_frame(index, vec![DetectionCandidate { bbox, confidence }])
    }

    /// The prediction every crop classifies to.
    pub fn with_prediction(mut self, prediction: AttributePrediction) -> Self {
        self.prediction = prediction;
        self
    }

    /// Make detection fail on a frame, for failure-path tests.
    pub fn failing_on(mut self, index: i64) -> Self {
        self.fail_frames.push(index);
        self
    }
}

#[async_trait]
impl Detector for FixtureSource {
    async fn detect(&self, frame: &Frame) -> Result<Vec<DetectionCandidate>, MlError> {
        if self.fail_frames.contains(&frame.index) {
            return Err(MlError::Inference(format!(
                "scripted failure on frame {}",
                frame.index
            )));
        }
        Ok(self.candidates.get(&frame.index).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl AttributeClassifier for FixtureSource {
    async fn classify(&self, _crop: &Path) -> Result<AttributePrediction, MlError> {
        Ok(self.prediction.clone())
    }
}

#[async_trait]
impl Segmenter for FixtureSource {
    async fn generate_mask(&self, frame: &Frame) -> Result<RegionMask, MlError> {
        Ok(RegionMask {
            frame_width: frame.width,
            frame_height: frame.height,
            region: BBox {
                x: 0,
                y: 0,
                width: frame.width,
                height: frame.height,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
