//! Export of filtered search results as JSON or CSV.
//!
//! Exports run the same conjunctive search as `/search/advanced` but
//! replace pagination with a hard row cap.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use vigil_core::error::CoreError;
use vigil_core::search::{SortBy, SortOrder, EXPORT_MAX_ROWS};
use vigil_core::types::DbId;
use vigil_db::models::search::{SearchFilters, SearchResultItem};
use vigil_db::repositories::search_repo::SearchRepo;

use crate::error::{AppError, AppResult};
use crate::response::PageResponse;
use crate::state::AppState;

/// Fixed CSV column order. Confidence columns follow their value column.
const CSV_HEADER: &str = "\
detection_id,video_id,video_filename,frame_number,timestamp_secs,\
bbox_x,bbox_y,bbox_width,bbox_height,\
gender,gender_confidence,upper_color,upper_color_confidence,\
lower_color,lower_color_confidence,aggregate_confidence,crop_path";

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
    pub gender: Option<String>,
    pub upper_color: Option<String>,
    pub lower_color: Option<String>,
    pub min_confidence: Option<f64>,
    pub video_id: Option<DbId>,
    pub start_timestamp: Option<f64>,
    pub end_timestamp: Option<f64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// GET /api/v1/export/detections?format=json|csv
///
/// Export rows matching the filters, capped at 10 000 rows regardless
/// of any pagination parameters.
pub async fn detections(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    if let Some(min) = params.min_confidence {
        if !(0.0..=1.0).contains(&min) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "min_confidence must be within [0, 1], got {min}"
            ))));
        }
    }
    let sort_by = params.sort_by.as_deref().map(SortBy::parse).transpose()?;
    let sort_order = params
        .sort_order
        .as_deref()
        .map(SortOrder::parse)
        .transpose()?;

    let filters = SearchFilters {
        gender: params.gender.clone(),
        upper_color: params.upper_color.clone(),
        lower_color: params.lower_color.clone(),
        min_confidence: params.min_confidence,
        video_id: params.video_id,
        start_timestamp: params.start_timestamp,
        end_timestamp: params.end_timestamp,
        sort_by,
        sort_order,
        ..Default::default()
    };
    let rows = SearchRepo::search_for_export(&state.pool, &filters, EXPORT_MAX_ROWS).await?;

    match params.format.as_deref().unwrap_or("json") {
        "json" => {
            let total = rows.len() as i64;
            Ok(Json(PageResponse { data: rows, total }).into_response())
        }
        "csv" => Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"detections_export.csv\"".to_string(),
                ),
            ],
            to_csv(&rows),
        )
            .into_response()),
        other => Err(AppError::BadRequest(format!(
            "Unsupported export format '{other}' (expected 'json' or 'csv')"
        ))),
    }
}

/// Render result rows as CSV with the fixed [`CSV_HEADER`] column order.
fn to_csv(rows: &[SearchResultItem]) -> String {
    let mut out = String::with_capacity(64 * (rows.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for row in rows {
        let fields = [
            row.detection_id.to_string(),
            row.video_id.to_string(),
            csv_field(&row.video_filename),
            row.frame_number.to_string(),
            row.timestamp_secs.to_string(),
            row.bbox_x.to_string(),
            row.bbox_y.to_string(),
            row.bbox_width.to_string(),
            row.bbox_height.to_string(),
            opt_str(&row.gender),
            opt_num(row.gender_confidence),
            opt_str(&row.upper_color),
            opt_num(row.upper_color_confidence),
            opt_str(&row.lower_color),
            opt_num(row.lower_color_confidence),
            row.aggregate_confidence.to_string(),
            opt_str(&row.crop_path),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

fn opt_str(value: &Option<String>) -> String {
    value.as_deref().map(csv_field).unwrap_or_default()
}

fn opt_num(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Quote a field when it contains a delimiter, quote, or newline;
/// embedded quotes are doubled.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
