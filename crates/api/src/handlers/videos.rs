//! Handlers for the `/videos` resource: upload, lifecycle, processing
//! control, and sub-clip export.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use vigil_core::error::CoreError;
use vigil_core::search::{clamp_limit, clamp_offset};
use vigil_core::types::DbId;
use vigil_db::models::video::{status, CreateVideo, Video};
use vigil_db::models::video::VideoTechMetadata;
use vigil_db::repositories::detection_repo::DetectionRepo;
use vigil_db::repositories::video_repo::VideoRepo;
use vigil_pipeline::processor::process_video;
use vigil_pipeline::progress::ProgressUpdate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::PageResponse;
use crate::state::AppState;

/// Supported source container extensions for upload.
const SUPPORTED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv", "flv"];

/// Default page size for video listings.
const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

fn video_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Video", id })
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/videos
///
/// List videos newest-first with the total row count.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<PageResponse<Video>>> {
    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let offset = clamp_offset(params.offset);
    let videos = VideoRepo::list(&state.pool, limit, offset).await?;
    let total = VideoRepo::count(&state.pool).await?;
    Ok(Json(PageResponse {
        data: videos,
        total,
    }))
}

/// GET /api/v1/videos/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Video>> {
    let video = VideoRepo::get(&state.pool, id)
        .await?
        .ok_or_else(|| video_not_found(id))?;
    Ok(Json(video))
}

/// POST /api/v1/videos
///
/// Accepts a multipart form with a required `file` field. The source is
/// stored under the media root, probed with ffprobe, and registered in
/// `uploaded` state with its technical metadata persisted. A file that
/// ffprobe cannot read is rejected and removed.
pub async fn upload(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Video>)> {
    let mut file_data: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload.mp4").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            file_data = Some((filename, data.to_vec()));
        }
    }

    let (filename, data) =
        file_data.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    // Strip any client-supplied path components.
    let filename = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("upload.mp4")
        .to_string();

    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    if !SUPPORTED_VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unsupported video format '.{ext}'. Supported: .mp4, .avi, .mov, .mkv, .wmv, .flv"
        )));
    }
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }
    if data.len() as u64 > state.config.max_upload_bytes() {
        return Err(AppError::BadRequest(format!(
            "File exceeds the {} MB upload limit",
            state.config.max_upload_mb
        )));
    }

    let uploads_dir = state.config.uploads_dir();
    tokio::fs::create_dir_all(&uploads_dir)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let stored_name = format!("{}_{filename}", Uuid::new_v4());
    let file_path = uploads_dir.join(&stored_name);
    tokio::fs::write(&file_path, &data)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    // Probe synchronously so a broken source never enters the registry.
    let metadata = match state.extractor.probe(&file_path).await {
        Ok(metadata) => metadata,
        Err(e) => {
            tokio::fs::remove_file(&file_path).await.ok();
            return Err(AppError::BadRequest(format!(
                "Not a processable video source: {e}"
            )));
        }
    };

    let video = VideoRepo::insert(
        &state.pool,
        &CreateVideo {
            filename,
            file_path: file_path.to_string_lossy().into_owned(),
            uploaded_by: user.map(|u| u.user_id),
        },
    )
    .await?;
    let video = VideoRepo::set_metadata(
        &state.pool,
        video.id,
        &VideoTechMetadata {
            fps: metadata.fps as f32,
            total_frames: metadata.total_frames as i32,
            resolution: format!("{}x{}", metadata.width, metadata.height),
            duration_seconds: metadata.duration_seconds,
        },
    )
    .await?;

    tracing::info!(
        video_id = video.id,
        filename = %video.filename,
        size_bytes = data.len(),
        "Video uploaded",
    );
    Ok((StatusCode::CREATED, Json(video)))
}

/// POST /api/v1/videos/{id}/process
///
/// Start a processing run. At most one run per video: the registry slot
/// is reserved before spawning, and the spawned task clears it when the
/// run reaches a terminal state.
pub async fn process(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    VideoRepo::get(&state.pool, id)
        .await?
        .ok_or_else(|| video_not_found(id))?;

    let guard = state.registry.submit(id).map_err(|_| {
        AppError::Core(CoreError::Conflict(format!(
            "Video {id} is already being processed"
        )))
    })?;

    let pool = state.pool.clone();
    let pipeline = state.pipeline.clone();
    let source = state.source.clone();
    let extractor = state.extractor.clone();
    let registry = state.registry.clone();
    let handle = tokio::spawn(async move {
        if let Err(e) = process_video(
            &pool,
            &pipeline,
            &source,
            extractor.as_ref(),
            id,
            &guard.progress,
            &guard.cancel,
        )
        .await
        {
            tracing::error!(video_id = id, error = %e, "Processing run ended in error");
        }
        registry.clear(id);
    });
    state.registry.attach(id, handle);

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "video_id": id, "status": "processing" })),
    ))
}

/// GET /api/v1/videos/{id}/status
///
/// Live progress for an in-flight run; otherwise a snapshot
/// reconstructed from the persisted video row.
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<ProgressUpdate>> {
    if let Some(update) = state.registry.status(id) {
        return Ok(Json(update));
    }

    let video = VideoRepo::get(&state.pool, id)
        .await?
        .ok_or_else(|| video_not_found(id))?;
    let total_frames = video.total_frames.unwrap_or(0) as i64;
    let update = match video.processing_status.as_str() {
        status::COMPLETED => {
            let detection_count = DetectionRepo::count_for_video(&state.pool, id).await?;
            ProgressUpdate::completed(id, total_frames, detection_count)
        }
        status::FAILED => ProgressUpdate::failed(
            id,
            video.error_message.as_deref().unwrap_or("processing failed"),
        ),
        status::CANCELLED => {
            // Reflect the committed work: the stop was observed between
            // frames, so persisted rows tell us how far the run got.
            let last_frame = DetectionRepo::last_frame_for_video(&state.pool, id)
                .await?
                .unwrap_or(0) as i64;
            let mut update = ProgressUpdate::cancelled(id, last_frame, total_frames);
            update.detection_count = DetectionRepo::count_for_video(&state.pool, id).await?;
            update
        }
        other => ProgressUpdate {
            video_id: id,
            status: other.to_string(),
            progress_pct: 0.0,
            current_frame: 0,
            total_frames,
            detection_count: 0,
            message: None,
        },
    };
    Ok(Json(update))
}

/// POST /api/v1/videos/{id}/cancel
///
/// Trip the run's cancellation token; the run itself transitions the
/// video to `cancelled` between frames. 409 when no run is in flight.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    VideoRepo::get(&state.pool, id)
        .await?
        .ok_or_else(|| video_not_found(id))?;

    if !state.registry.cancel(id) {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "No active processing run for video {id}"
        ))));
    }
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "video_id": id, "cancelling": true })),
    ))
}

/// DELETE /api/v1/videos/{id}
///
/// Refused while a run is in flight. Removes the database row (derived
/// rows cascade) and best-effort removes the source file and extracted
/// media.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if state.registry.is_running(id) {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Video {id} is being processed; cancel the run first"
        ))));
    }
    let video = VideoRepo::get(&state.pool, id)
        .await?
        .ok_or_else(|| video_not_found(id))?;

    if !VideoRepo::delete(&state.pool, id).await? {
        return Err(video_not_found(id));
    }

    tokio::fs::remove_file(&video.file_path).await.ok();
    tokio::fs::remove_dir_all(state.pipeline.crops_dir(id)).await.ok();
    tokio::fs::remove_dir_all(state.pipeline.frames_dir(id)).await.ok();
    state.registry.clear(id);

    tracing::info!(video_id = id, "Video deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ClipParams {
    pub start: f64,
    pub end: f64,
}

/// GET /api/v1/videos/{id}/clip?start=S&end=E
///
/// Export a sub-clip of the source as MP4. The window is validated
/// against the probed duration; `end` is clamped to it.
pub async fn clip(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<ClipParams>,
) -> AppResult<impl IntoResponse> {
    let video = VideoRepo::get(&state.pool, id)
        .await?
        .ok_or_else(|| video_not_found(id))?;

    if params.start < 0.0 || !params.start.is_finite() || !params.end.is_finite() {
        return Err(AppError::Core(CoreError::Validation(
            "start and end must be non-negative finite seconds".into(),
        )));
    }
    let end = match video.duration_seconds {
        Some(duration) => params.end.min(duration),
        None => params.end,
    };
    if end <= params.start {
        return Err(AppError::Core(CoreError::Validation(
            "end must be greater than start and inside the video".into(),
        )));
    }

    let clips_dir = state.config.clips_dir().join(id.to_string());
    tokio::fs::create_dir_all(&clips_dir)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let output = clips_dir.join(format!("clip_{:.3}_{:.3}.mp4", params.start, end));
    vigil_core::ffmpeg::extract_clip(
        std::path::Path::new(&video.file_path),
        &output,
        params.start,
        end,
    )
    .await?;

    let bytes = tokio::fs::read(&output)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"clip_{id}.mp4\""),
            ),
        ],
        bytes,
    ))
}
