//! Handlers for processing performance metrics.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use vigil_core::error::CoreError;
use vigil_core::search::clamp_limit;
use vigil_core::types::DbId;
use vigil_db::models::performance_metric::{MetricsSummary, PerformanceMetric, VideoMetricRow};
use vigil_db::repositories::performance_metric_repo::PerformanceMetricRepo;
use vigil_db::repositories::video_repo::VideoRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

/// GET /api/v1/metrics/summary
pub async fn summary(State(state): State<AppState>) -> AppResult<Json<MetricsSummary>> {
    let summary = PerformanceMetricRepo::summary(&state.pool).await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct MetricsListParams {
    pub limit: Option<i64>,
}

/// GET /api/v1/metrics/videos
///
/// Latest metric per video, joined with the video row.
pub async fn per_video(
    State(state): State<AppState>,
    Query(params): Query<MetricsListParams>,
) -> AppResult<Json<DataResponse<Vec<VideoMetricRow>>>> {
    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let rows = PerformanceMetricRepo::per_video(&state.pool, limit).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// GET /api/v1/metrics/videos/{id}
///
/// Latest metric for one video; 404 until a run has completed.
pub async fn for_video(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<PerformanceMetric>> {
    VideoRepo::get(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Video", id }))?;
    let metric = PerformanceMetricRepo::latest_for_video(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PerformanceMetric",
            id,
        }))?;
    Ok(Json(metric))
}
