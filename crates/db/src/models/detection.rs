//! Detection entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::types::{DbId, Timestamp};

/// A row from the `detections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Detection {
    pub id: DbId,
    pub video_id: DbId,
    pub frame_number: i32,
    pub timestamp_secs: f64,
    pub bbox_x: i32,
    pub bbox_y: i32,
    pub bbox_width: i32,
    pub bbox_height: i32,
    pub detection_confidence: f64,
    pub crop_path: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for inserting a detection.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDetection {
    pub video_id: DbId,
    pub frame_number: i32,
    pub timestamp_secs: f64,
    pub bbox_x: i32,
    pub bbox_y: i32,
    pub bbox_width: i32,
    pub bbox_height: i32,
    pub detection_confidence: f64,
    pub crop_path: Option<String>,
}

/// A detection joined with its attribute row, as returned by detail and
/// listing queries.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DetectionWithAttributes {
    pub id: DbId,
    pub video_id: DbId,
    pub frame_number: i32,
    pub timestamp_secs: f64,
    pub bbox_x: i32,
    pub bbox_y: i32,
    pub bbox_width: i32,
    pub bbox_height: i32,
    pub detection_confidence: f64,
    pub crop_path: Option<String>,
    pub upper_color: Option<String>,
    pub upper_color_confidence: Option<f64>,
    pub lower_color: Option<String>,
    pub lower_color_confidence: Option<f64>,
    pub gender: Option<String>,
    pub gender_confidence: Option<f64>,
    pub aggregate_confidence: f64,
}

/// One bucket of a per-video distribution (gender or color counts).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DistributionBucket {
    pub value: String,
    pub count: i64,
}

/// Per-video detection summary for the summary endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionSummary {
    pub video_id: DbId,
    pub total_detections: i64,
    pub frames_with_detections: i64,
    pub gender_distribution: Vec<DistributionBucket>,
    pub upper_color_distribution: Vec<DistributionBucket>,
    pub lower_color_distribution: Vec<DistributionBucket>,
}
