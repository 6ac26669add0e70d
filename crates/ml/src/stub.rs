//! Randomized demo implementation of the inference boundary.
//!
//! Produces plausible detections and attributes so the full pipeline,
//! search, and alerting can be exercised without model weights. Seedable
//! for reproducible demo runs.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vigil_core::bbox::BBox;

use crate::{
    AttributeClassifier, AttributePrediction, DetectionCandidate, Detector, Frame, MlError,
    RegionMask, Segmenter,
};

const COLORS: &[&str] = &[
    "red", "blue", "black", "white", "gray", "green", "yellow", "brown", "pink", "orange",
];

/// Candidates below this confidence are dropped before they leave the
/// detector.
const CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Seedable randomized attribute source.
pub struct StubSource {
    rng: Mutex<StdRng>,
}

impl StubSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // Lock poisoning cannot happen: no closure here panics.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }

    /// male/female 45% each, unknown 10%.
    fn pick_gender(rng: &mut StdRng) -> &'static str {
        let roll: f64 = rng.random_range(0.0..1.0);
        if roll < 0.45 {
            "male"
        } else if roll < 0.90 {
            "female"
        } else {
            "unknown"
        }
    }
}

#[async_trait]
impl Detector for StubSource {
    async fn detect(&self, frame: &Frame) -> Result<Vec<DetectionCandidate>, MlError> {
        if frame.width < 4 || frame.height < 4 {
            return Ok(Vec::new());
        }
        let candidates = self.with_rng(|rng| {
            let count = rng.random_range(0..=5);
            (0..count)
                .filter_map(|_| {
                    let width = rng.random_range(60..=150.min(frame.width / 3).max(60));
                    let height = rng.random_range(120..=250.min(frame.height / 2).max(120));
                    let x = rng.random_range(0..=(frame.width - width).max(1));
                    let y = rng.random_range(0..=(frame.height - height).max(1));
                    let confidence = rng.random_range(0.65..0.95);
                    (confidence >= CONFIDENCE_THRESHOLD).then(|| DetectionCandidate {
                        bbox: BBox {
                            x,
                            y,
                            width,
                            height,
                        },
                        confidence,
                    })
                })
                .collect()
        });
        Ok(candidates)
    }
}

#[async_trait]
impl AttributeClassifier for StubSource {
    async fn classify(&self, _crop: &Path) -> Result<AttributePrediction, MlError> {
        Ok(self.with_rng(|rng| {
            let upper = COLORS[rng.random_range(0..COLORS.len())];
            let lower = COLORS[rng.random_range(0..COLORS.len())];
            let gender = Self::pick_gender(rng);
            AttributePrediction {
                upper_color: Some(upper.to_string()),
                upper_color_confidence: Some(rng.random_range(0.65..0.92)),
                lower_color: Some(lower.to_string()),
                lower_color_confidence: Some(rng.random_range(0.65..0.92)),
                gender: Some(gender.to_string()),
                gender_confidence: Some(rng.random_range(0.70..0.95)),
            }
        }))
    }
}

#[async_trait]
impl Segmenter for StubSource {
    async fn generate_mask(&self, frame: &Frame) -> Result<RegionMask, MlError> {
        // Fixed walkable rectangle: center 70% horizontally, bottom 60%.
        let x = (frame.width as f64 * 0.15) as i32;
        let y = (frame.height as f64 * 0.40) as i32;
        Ok(RegionMask {
            frame_width: frame.width,
            frame_height: frame.height,
            region: BBox {
                x,
                y,
                width: (frame.width as f64 * 0.70) as i32,
                height: frame.height - y,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: i32, height: i32) -> Frame {
        Frame {
            index: 0,
            width,
            height,
            image_path: "frame_0.jpg".into(),
        }
    }

    #[tokio::test]
    async fn same_seed_same_detections() {
        let a = StubSource::new(7);
        let b = StubSource::new(7);
        let f = frame(1280, 720);
        let da = a.detect(&f).await.unwrap();
        let db = b.detect(&f).await.unwrap();
        assert_eq!(da.len(), db.len());
        for (x, y) in da.iter().zip(db.iter()) {
            assert_eq!(x.bbox, y.bbox);
            assert_eq!(x.confidence, y.confidence);
        }
    }

    #[tokio::test]
    async fn detections_stay_plausible() {
        let source = StubSource::new(42);
        let f = frame(1920, 1080);
        for _ in 0..20 {
            for candidate in source.detect(&f).await.unwrap() {
                assert!(candidate.confidence >= CONFIDENCE_THRESHOLD);
                assert!(candidate.bbox.width >= 60);
                assert!(candidate.bbox.height >= 120);
            }
        }
    }

    #[tokio::test]
    async fn tiny_frame_yields_no_candidates() {
        let source = StubSource::new(1);
        assert!(source.detect(&frame(2, 2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn classification_values_in_vocabulary() {
        let source = StubSource::new(3);
        let prediction = source.classify(Path::new("crop.jpg")).await.unwrap();
        assert!(COLORS.contains(&prediction.upper_color.as_deref().unwrap()));
        assert!(COLORS.contains(&prediction.lower_color.as_deref().unwrap()));
        let gender = prediction.gender.as_deref().unwrap();
        assert!(["male", "female", "unknown"].contains(&gender));
        let conf = prediction.gender_confidence.unwrap();
        assert!((0.70..0.95).contains(&conf));
    }

    #[tokio::test]
    async fn mask_excludes_roughly_the_border() {
        let source = StubSource::new(0);
        let mask = source.generate_mask(&frame(1000, 1000)).await.unwrap();
        let pct = mask.area_reduction_pct();
        assert!((50.0..70.0).contains(&pct), "got {pct}");
    }
}
