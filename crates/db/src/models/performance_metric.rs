//! Performance metric entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::types::{DbId, Timestamp};

/// A row from the `performance_metrics` table. Append-only, one per
/// completed processing run.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PerformanceMetric {
    pub id: DbId,
    pub video_id: DbId,
    pub avg_fps: f64,
    pub total_detections: i32,
    pub processing_time_seconds: f64,
    pub area_reduction_percentage: Option<f64>,
    pub recorded_at: Timestamp,
}

/// DTO for recording a processing run's metrics.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePerformanceMetric {
    pub video_id: DbId,
    pub avg_fps: f64,
    pub total_detections: i32,
    pub processing_time_seconds: f64,
    pub area_reduction_percentage: Option<f64>,
}

/// System-wide aggregates for the metrics summary endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MetricsSummary {
    pub total_videos: i64,
    pub completed_videos: i64,
    pub total_detections: i64,
    pub total_processing_time_seconds: f64,
    pub avg_processing_fps: f64,
}

/// Per-video metric joined with the video row for the listing endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VideoMetricRow {
    pub video_id: DbId,
    pub filename: String,
    pub processing_status: String,
    pub avg_fps: f64,
    pub total_detections: i32,
    pub processing_time_seconds: f64,
    pub area_reduction_percentage: Option<f64>,
    pub recorded_at: Timestamp,
}
