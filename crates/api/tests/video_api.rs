//! Integration tests for the `/videos` resource: listing, lifecycle,
//! processing control, and upload validation.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, delete, get, post_empty, seed_detection, seed_video};
use sqlx::PgPool;
use tower::ServiceExt;
use vigil_db::models::video::status;
use vigil_db::repositories::video_repo::VideoRepo;

/// Build a multipart upload request for `POST /api/v1/videos`.
fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
    let boundary = "test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/videos")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

// -- listing and detail ------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn list_returns_videos_newest_first_with_total(pool: PgPool) {
    let first = seed_video(&pool).await;
    let second = seed_video(&pool).await;

    let response = get(common::build_test_app(pool), "/api/v1/videos").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total"], 2);
    assert_eq!(json["data"][0]["id"], second.id);
    assert_eq!(json["data"][1]["id"], first.id);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn get_returns_probed_metadata(pool: PgPool) {
    let video = seed_video(&pool).await;

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/videos/{}", video.id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["processing_status"], "uploaded");
    assert_eq!(json["total_frames"], 300);
    assert_eq!(json["resolution"], "1920x1080");
}

// -- upload validation -------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_rejects_unsupported_extension(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = app
        .oneshot(upload_request("notes.txt", b"not a video"))
        .await
        .unwrap();

    common::assert_error(response, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_rejects_empty_file(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = app.oneshot(upload_request("empty.mp4", b"")).await.unwrap();

    common::assert_error(response, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_rejects_missing_file_field(pool: PgPool) {
    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"notes\"\r\n\r\nhello\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/videos")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let app = common::build_test_app(pool);
    let response = app.oneshot(request).await.unwrap();
    common::assert_error(response, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
}

// -- processing control ------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn process_missing_video_returns_404(pool: PgPool) {
    let response = post_empty(common::build_test_app(pool), "/api/v1/videos/9999/process").await;
    common::assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn cancel_without_active_run_conflicts(pool: PgPool) {
    let video = seed_video(&pool).await;

    let response = post_empty(
        common::build_test_app(pool),
        &format!("/api/v1/videos/{}/cancel", video.id),
    )
    .await;
    common::assert_error(response, StatusCode::CONFLICT, "CONFLICT").await;
}

// -- status reconstruction ---------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn status_of_uploaded_video_is_idle(pool: PgPool) {
    let video = seed_video(&pool).await;

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/videos/{}/status", video.id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "uploaded");
    assert_eq!(json["progress_pct"], 0.0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn status_of_completed_video_reports_full_progress(pool: PgPool) {
    let video = seed_video(&pool).await;
    seed_detection(&pool, video.id, 15, Some("female"), Some(0.9), Some("red"), Some(0.8)).await;
    seed_detection(&pool, video.id, 30, Some("male"), Some(0.95), Some("blue"), Some(0.85)).await;
    VideoRepo::set_status(&pool, video.id, status::COMPLETED)
        .await
        .unwrap();

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/videos/{}/status", video.id),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["status"], "completed");
    assert_eq!(json["progress_pct"], 100.0);
    assert_eq!(json["detection_count"], 2);
    assert_eq!(json["total_frames"], 300);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn status_of_failed_video_carries_persisted_message(pool: PgPool) {
    let video = seed_video(&pool).await;
    VideoRepo::set_failed(&pool, video.id, "probe failed: ffmpeg binary not found")
        .await
        .unwrap();

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/videos/{}/status", video.id),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["status"], "failed");
    // The run's terminal error survives the registry entry being cleared.
    assert_eq!(json["message"], "probe failed: ffmpeg binary not found");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn status_of_cancelled_video_reflects_committed_frames(pool: PgPool) {
    let video = seed_video(&pool).await;
    seed_detection(&pool, video.id, 15, Some("female"), Some(0.9), Some("red"), Some(0.8)).await;
    seed_detection(&pool, video.id, 30, Some("male"), Some(0.95), Some("blue"), Some(0.85)).await;
    VideoRepo::set_status(&pool, video.id, status::CANCELLED)
        .await
        .unwrap();

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/videos/{}/status", video.id),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["status"], "cancelled");
    assert_eq!(json["current_frame"], 30);
    assert_eq!(json["detection_count"], 2);
    assert_eq!(json["progress_pct"], 10.0);
}

// -- deletion ----------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_removes_video_and_detections(pool: PgPool) {
    let video = seed_video(&pool).await;
    seed_detection(&pool, video.id, 15, Some("female"), Some(0.9), None, None).await;

    let response = delete(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/videos/{}", video.id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/videos/{}", video.id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
