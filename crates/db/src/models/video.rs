//! Video entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::types::{DbId, Timestamp};

/// Lifecycle states of a video row. Stored as lowercase TEXT.
pub mod status {
    pub const UPLOADED: &str = "uploaded";
    pub const PROCESSING: &str = "processing";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
    pub const CANCELLED: &str = "cancelled";
}

/// A row from the `videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Video {
    pub id: DbId,
    pub filename: String,
    pub file_path: String,
    pub fps: Option<f32>,
    pub total_frames: Option<i32>,
    pub resolution: Option<String>,
    pub duration_seconds: Option<f64>,
    pub processing_status: String,
    /// Terminal error text from the last failed run; NULL otherwise.
    pub error_message: Option<String>,
    pub uploaded_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering an uploaded video.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVideo {
    pub filename: String,
    pub file_path: String,
    pub uploaded_by: Option<DbId>,
}

/// Technical metadata persisted after probing the source.
#[derive(Debug, Clone)]
pub struct VideoTechMetadata {
    pub fps: f32,
    pub total_frames: i32,
    pub resolution: String,
    pub duration_seconds: f64,
}
