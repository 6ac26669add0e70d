//! Handlers for attribute search: natural-language queries, structured
//! queries, and the search audit trail.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use vigil_core::error::CoreError;
use vigil_core::query_parser::{parse_query, ParsedQuery};
use vigil_core::search::{clamp_limit, DEFAULT_MIN_CONFIDENCE, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
use vigil_core::types::DbId;
use vigil_db::models::search::{SearchFilters, SearchHistoryEntry, SearchResultItem};
use vigil_db::repositories::search_history_repo::SearchHistoryRepo;
use vigil_db::repositories::search_repo::SearchRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;

fn validate_min_confidence(min_confidence: Option<f64>) -> AppResult<()> {
    if let Some(min) = min_confidence {
        if !(0.0..=1.0).contains(&min) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "min_confidence must be within [0, 1], got {min}"
            ))));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct NlQueryRequest {
    pub query: String,
    pub video_id: Option<DbId>,
    pub min_confidence: Option<f64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct NlQueryResponse {
    /// The predicates extracted from the query text. Dimensions that
    /// could not be extracted are absent, never guessed.
    pub parsed: ParsedQuery,
    pub data: Vec<SearchResultItem>,
    pub total: i64,
}

/// POST /api/v1/search/query
///
/// Parse a free-text description into attribute predicates and run the
/// search. The executed query is appended to the history trail.
pub async fn query(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(request): Json<NlQueryRequest>,
) -> AppResult<Json<NlQueryResponse>> {
    if request.query.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Query text must not be empty".into(),
        )));
    }
    validate_min_confidence(request.min_confidence)?;

    let parsed = parse_query(&request.query);
    let filters = SearchFilters {
        gender: parsed.gender.clone(),
        upper_color: parsed.upper_color.clone(),
        lower_color: parsed.lower_color.clone(),
        min_confidence: request.min_confidence,
        video_id: request.video_id,
        limit: request.limit,
        offset: request.offset,
        ..Default::default()
    };
    let (items, total) = SearchRepo::search(&state.pool, &filters).await?;

    let parsed_attributes = serde_json::to_value(&parsed).unwrap_or(serde_json::Value::Null);
    SearchHistoryRepo::insert(
        &state.pool,
        user.map(|u| u.user_id),
        request.query.trim(),
        &parsed_attributes,
        total as i32,
    )
    .await?;

    Ok(Json(NlQueryResponse {
        parsed,
        data: items,
        total,
    }))
}

/// POST /api/v1/search/advanced
///
/// Structured attribute search. All set predicates are conjunctive; the
/// confidence filter defaults to 0.6 when absent.
pub async fn advanced(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(filters): Json<SearchFilters>,
) -> AppResult<Json<PageResponse<SearchResultItem>>> {
    validate_min_confidence(filters.min_confidence)?;

    let (items, total) = SearchRepo::search(&state.pool, &filters).await?;

    let parsed_attributes = json!({
        "gender": filters.gender,
        "upper_color": filters.upper_color,
        "lower_color": filters.lower_color,
        "min_confidence": filters.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE),
    });
    SearchHistoryRepo::insert(
        &state.pool,
        user.map(|u| u.user_id),
        &describe_filters(&filters),
        &parsed_attributes,
        total as i32,
    )
    .await?;

    Ok(Json(PageResponse { data: items, total }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

/// GET /api/v1/search/history
pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<DataResponse<Vec<SearchHistoryEntry>>>> {
    let limit = clamp_limit(params.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
    let entries = SearchHistoryRepo::list(&state.pool, limit).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// DELETE /api/v1/search/history/{id}
pub async fn delete_history(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !SearchHistoryRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "SearchHistoryEntry",
            id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/search/history
pub async fn clear_history(
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let deleted = SearchHistoryRepo::clear(&state.pool).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// Readable one-line form of a structured query, stored as the history
/// entry's query text.
fn describe_filters(filters: &SearchFilters) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(gender) = &filters.gender {
        parts.push(format!("gender={gender}"));
    }
    if let Some(upper) = &filters.upper_color {
        parts.push(format!("upper_color={upper}"));
    }
    if let Some(lower) = &filters.lower_color {
        parts.push(format!("lower_color={lower}"));
    }
    if let Some(video_id) = filters.video_id {
        parts.push(format!("video={video_id}"));
    }
    if parts.is_empty() {
        "all detections".to_string()
    } else {
        parts.join(" ")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
