//! Attribute entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::types::{DbId, Timestamp};

/// A row from the `attributes` table. Every component is nullable; a
/// classifier that cannot commit to a dimension leaves it NULL. The
/// aggregate confidence is derived at query time, never stored.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attribute {
    pub id: DbId,
    pub detection_id: DbId,
    pub upper_color: Option<String>,
    pub upper_color_confidence: Option<f64>,
    pub lower_color: Option<String>,
    pub lower_color_confidence: Option<f64>,
    pub gender: Option<String>,
    pub gender_confidence: Option<f64>,
    pub created_at: Timestamp,
}

/// DTO for inserting an attribute row alongside its detection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAttribute {
    pub upper_color: Option<String>,
    pub upper_color_confidence: Option<f64>,
    pub lower_color: Option<String>,
    pub lower_color_confidence: Option<f64>,
    pub gender: Option<String>,
    pub gender_confidence: Option<f64>,
}
