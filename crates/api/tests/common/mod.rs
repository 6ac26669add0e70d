#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use vigil_api::config::ServerConfig;
use vigil_api::router::build_app_router;
use vigil_api::state::AppState;
use vigil_core::types::DbId;
use vigil_db::models::attribute::CreateAttribute;
use vigil_db::models::detection::CreateDetection;
use vigil_db::models::video::{CreateVideo, Video, VideoTechMetadata};
use vigil_db::repositories::detection_repo::DetectionRepo;
use vigil_db::repositories::video_repo::VideoRepo;
use vigil_ml::StubSource;
use vigil_pipeline::media::FfmpegExtractor;
use vigil_pipeline::processor::{AttributeSource, PipelineConfig};
use vigil_pipeline::registry::JobRegistry;

/// Build a test `ServerConfig` with safe defaults and a throwaway media
/// root under the system temp directory.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        media_root: std::env::temp_dir().join(format!("vigil-api-test-{}", Uuid::new_v4())),
        max_upload_mb: 8,
        database_max_connections: 5,
    }
}

/// Build the full application router with all middleware layers, using
/// the given database pool.
///
/// This mirrors the router construction in `main.rs` (via
/// [`build_app_router`]) so integration tests exercise the same
/// middleware stack that production uses. Inference backends are the
/// deterministic stubs.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    std::fs::create_dir_all(config.uploads_dir()).expect("Failed to create test media root");

    let stub = Arc::new(StubSource::new(7));
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        registry: Arc::new(JobRegistry::new()),
        pipeline: PipelineConfig::new(config.media_root.clone()),
        source: AttributeSource {
            detector: stub.clone(),
            classifier: stub.clone(),
            segmenter: stub,
        },
        extractor: Arc::new(FfmpegExtractor),
    };

    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: &serde_json::Value) -> Response {
    send_json(app, Method::POST, uri, body, None).await
}

pub async fn put_json(app: Router, uri: &str, body: &serde_json::Value) -> Response {
    send_json(app, Method::PUT, uri, body, None).await
}

/// POST with a JSON body and an `x-user-id` identity header.
pub async fn post_json_as(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
    user_id: DbId,
) -> Response {
    send_json(app, Method::POST, uri, body, Some(user_id)).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty_as(app: Router, uri: &str, user_id: DbId) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("x-user-id", user_id.to_string())
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn delete(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: &serde_json::Value,
    user_id: Option<DbId>,
) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user_id) = user_id {
        builder = builder.header("x-user-id", user_id.to_string());
    }
    let request = builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as a UTF-8 string.
pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Assert the standard `{ "error": ..., "code": ... }` envelope.
pub async fn assert_error(response: Response, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code);
    assert!(json["error"].is_string());
}

// ---------------------------------------------------------------------------
// Database seeding
// ---------------------------------------------------------------------------

/// Insert a probed video (30 fps, 300 frames, 10 s) in `uploaded` state.
pub async fn seed_video(pool: &PgPool) -> Video {
    let video = VideoRepo::insert(
        pool,
        &CreateVideo {
            filename: "lobby_cam.mp4".to_string(),
            file_path: "/data/media/uploads/lobby_cam.mp4".to_string(),
            uploaded_by: None,
        },
    )
    .await
    .unwrap();
    VideoRepo::set_metadata(
        pool,
        video.id,
        &VideoTechMetadata {
            fps: 30.0,
            total_frames: 300,
            resolution: "1920x1080".to_string(),
            duration_seconds: 10.0,
        },
    )
    .await
    .unwrap()
}

/// Insert one detection with its attribute row; returns the detection id.
pub async fn seed_detection(
    pool: &PgPool,
    video_id: DbId,
    frame: i32,
    gender: Option<&str>,
    gender_confidence: Option<f64>,
    upper_color: Option<&str>,
    upper_color_confidence: Option<f64>,
) -> DbId {
    let rows = vec![(
        CreateDetection {
            video_id,
            frame_number: frame,
            timestamp_secs: frame as f64 / 30.0,
            bbox_x: 100,
            bbox_y: 200,
            bbox_width: 80,
            bbox_height: 160,
            detection_confidence: 0.9,
            crop_path: None,
        },
        CreateAttribute {
            upper_color: upper_color.map(str::to_string),
            upper_color_confidence,
            lower_color: None,
            lower_color_confidence: None,
            gender: gender.map(str::to_string),
            gender_confidence,
        },
    )];
    DetectionRepo::insert_frame_batch(pool, &rows).await.unwrap()[0]
}
