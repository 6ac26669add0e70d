//! Search filter, result, and history models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::search::{SortBy, SortOrder};
use vigil_core::types::{DbId, Timestamp};

/// Conjunctive attribute-search predicates. `None` means "do not filter
/// on this dimension".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilters {
    pub gender: Option<String>,
    pub upper_color: Option<String>,
    pub lower_color: Option<String>,
    pub min_confidence: Option<f64>,
    pub video_id: Option<DbId>,
    pub start_timestamp: Option<f64>,
    pub end_timestamp: Option<f64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
}

impl SearchFilters {
    /// Whether any attribute predicate is set (ignoring pagination and
    /// confidence defaults).
    pub fn has_attribute_predicate(&self) -> bool {
        self.gender.is_some() || self.upper_color.is_some() || self.lower_color.is_some()
    }
}

/// One search hit: detection identity and location, source video, the
/// six attribute components, and the derived aggregate confidence.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SearchResultItem {
    pub detection_id: DbId,
    pub video_id: DbId,
    pub video_filename: String,
    pub frame_number: i32,
    pub timestamp_secs: f64,
    pub bbox_x: i32,
    pub bbox_y: i32,
    pub bbox_width: i32,
    pub bbox_height: i32,
    pub crop_path: Option<String>,
    pub upper_color: Option<String>,
    pub upper_color_confidence: Option<f64>,
    pub lower_color: Option<String>,
    pub lower_color_confidence: Option<f64>,
    pub gender: Option<String>,
    pub gender_confidence: Option<f64>,
    pub aggregate_confidence: f64,
}

/// A row from the `search_history` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SearchHistoryEntry {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub query_text: String,
    pub parsed_attributes: serde_json::Value,
    pub result_count: i32,
    pub searched_at: Timestamp,
}
