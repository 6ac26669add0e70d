//! Handlers for detection listing, detail, and media retrieval.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use vigil_core::error::CoreError;
use vigil_core::search::{clamp_limit, clamp_offset, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
use vigil_core::types::DbId;
use vigil_db::models::detection::{DetectionSummary, DetectionWithAttributes};
use vigil_db::repositories::detection_repo::DetectionRepo;
use vigil_db::repositories::video_repo::VideoRepo;

use crate::error::{AppError, AppResult};
use crate::response::PageResponse;
use crate::state::AppState;

fn detection_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Detection",
        id,
    })
}

async fn require_video(state: &AppState, id: DbId) -> AppResult<()> {
    VideoRepo::get(&state.pool, id)
        .await?
        .map(|_| ())
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Video", id }))
}

#[derive(Debug, Deserialize)]
pub struct DetectionListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub min_confidence: Option<f64>,
}

/// GET /api/v1/videos/{id}/detections
///
/// Detections of one video in frame order, optionally filtered by the
/// derived aggregate confidence.
pub async fn list_for_video(
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
    Query(params): Query<DetectionListParams>,
) -> AppResult<Json<PageResponse<DetectionWithAttributes>>> {
    require_video(&state, video_id).await?;
    if let Some(min) = params.min_confidence {
        if !(0.0..=1.0).contains(&min) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "min_confidence must be within [0, 1], got {min}"
            ))));
        }
    }

    let limit = clamp_limit(params.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
    let offset = clamp_offset(params.offset);
    let items = DetectionRepo::list_for_video(
        &state.pool,
        video_id,
        params.min_confidence,
        limit,
        offset,
    )
    .await?;
    let total = DetectionRepo::count_for_video(&state.pool, video_id).await?;
    Ok(Json(PageResponse { data: items, total }))
}

/// GET /api/v1/videos/{id}/detections/summary
pub async fn summary(
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<Json<DetectionSummary>> {
    require_video(&state, video_id).await?;
    let summary = DetectionRepo::summary(&state.pool, video_id).await?;
    Ok(Json(summary))
}

/// GET /api/v1/detections/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DetectionWithAttributes>> {
    let detection = DetectionRepo::get_with_attributes(&state.pool, id)
        .await?
        .ok_or_else(|| detection_not_found(id))?;
    Ok(Json(detection))
}

/// GET /api/v1/detections/{id}/crop
///
/// Serve the persisted crop JPEG for a detection. 404 when the
/// detection has no crop or its file has been pruned.
pub async fn crop(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detection = DetectionRepo::get(&state.pool, id)
        .await?
        .ok_or_else(|| detection_not_found(id))?;
    let crop_path = detection
        .crop_path
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Crop", id }))?;
    let bytes = tokio::fs::read(&crop_path)
        .await
        .map_err(|_| AppError::Core(CoreError::NotFound { entity: "Crop", id }))?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}

/// GET /api/v1/detections/{id}/frame
///
/// Serve the full source frame the detection was found in, extracting
/// it on demand when the sampled frame file is no longer on disk.
pub async fn frame(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detection = DetectionRepo::get(&state.pool, id)
        .await?
        .ok_or_else(|| detection_not_found(id))?;
    let video = VideoRepo::get(&state.pool, detection.video_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id: detection.video_id,
        }))?;

    let frames_dir = state.pipeline.frames_dir(video.id);
    let frame_path = frames_dir.join(format!("frame_{}.jpg", detection.frame_number));
    if !frame_path.exists() {
        tokio::fs::create_dir_all(&frames_dir)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        state
            .extractor
            .extract_frame(
                std::path::Path::new(&video.file_path),
                &frame_path,
                detection.timestamp_secs,
            )
            .await?;
    }

    let bytes = tokio::fs::read(&frame_path)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}
