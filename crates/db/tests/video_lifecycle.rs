mod common;

use common::{attribute, detection_at, seed_detection, seed_video};
use sqlx::PgPool;
use vigil_db::models::video::status;
use vigil_db::repositories::detection_repo::DetectionRepo;
use vigil_db::repositories::video_repo::VideoRepo;

#[sqlx::test]
async fn insert_starts_uploaded_with_no_metadata(pool: PgPool) {
    let video = VideoRepo::insert(
        &pool,
        &vigil_db::models::video::CreateVideo {
            filename: "lobby.mp4".to_string(),
            file_path: "/data/uploads/lobby.mp4".to_string(),
            uploaded_by: Some(7),
        },
    )
    .await
    .unwrap();

    assert_eq!(video.processing_status, status::UPLOADED);
    assert_eq!(video.fps, None);
    assert_eq!(video.total_frames, None);
    assert_eq!(video.uploaded_by, Some(7));
}

#[sqlx::test]
async fn metadata_persists_before_processing(pool: PgPool) {
    let video = seed_video(&pool, "dock.mp4").await;
    assert_eq!(video.fps, Some(30.0));
    assert_eq!(video.total_frames, Some(300));
    assert_eq!(video.resolution.as_deref(), Some("1920x1080"));
    assert_eq!(video.duration_seconds, Some(10.0));
    // Metadata update does not touch the status.
    assert_eq!(video.processing_status, status::UPLOADED);
}

#[sqlx::test]
async fn processing_claim_is_exclusive(pool: PgPool) {
    let video = seed_video(&pool, "gate.mp4").await;

    assert!(VideoRepo::try_set_processing(&pool, video.id).await.unwrap());
    // A second claim while processing must lose.
    assert!(!VideoRepo::try_set_processing(&pool, video.id).await.unwrap());

    VideoRepo::set_status(&pool, video.id, status::COMPLETED)
        .await
        .unwrap();
    // Terminal state frees the claim for a re-run.
    assert!(VideoRepo::try_set_processing(&pool, video.id).await.unwrap());
}

#[sqlx::test]
async fn claim_on_missing_video_fails(pool: PgPool) {
    assert!(!VideoRepo::try_set_processing(&pool, 9999).await.unwrap());
}

#[sqlx::test]
async fn failure_message_persists_until_the_next_claim(pool: PgPool) {
    let video = seed_video(&pool, "gate.mp4").await;
    VideoRepo::set_failed(&pool, video.id, "source reports no frames")
        .await
        .unwrap();

    let failed = VideoRepo::get(&pool, video.id).await.unwrap().unwrap();
    assert_eq!(failed.processing_status, status::FAILED);
    assert_eq!(failed.error_message.as_deref(), Some("source reports no frames"));

    // A re-run claim wipes the stale error text.
    assert!(VideoRepo::try_set_processing(&pool, video.id).await.unwrap());
    let claimed = VideoRepo::get(&pool, video.id).await.unwrap().unwrap();
    assert_eq!(claimed.error_message, None);
}

#[sqlx::test]
async fn delete_cascades_derived_rows(pool: PgPool) {
    let video = seed_video(&pool, "yard.mp4").await;
    seed_detection(
        &pool,
        detection_at(video.id, 15, 100, 0.9),
        attribute("male", 0.9, "red", 0.8),
    )
    .await;
    assert_eq!(DetectionRepo::count_for_video(&pool, video.id).await.unwrap(), 1);

    assert!(VideoRepo::delete(&pool, video.id).await.unwrap());
    assert!(VideoRepo::get(&pool, video.id).await.unwrap().is_none());
    assert_eq!(DetectionRepo::count_for_video(&pool, video.id).await.unwrap(), 0);

    let orphan_attributes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attributes")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orphan_attributes, 0);
}

#[sqlx::test]
async fn list_orders_newest_first(pool: PgPool) {
    let first = seed_video(&pool, "a.mp4").await;
    let second = seed_video(&pool, "b.mp4").await;

    let listed = VideoRepo::list(&pool, 10, 0).await.unwrap();
    assert_eq!(listed.len(), 2);
    // Identical created_at timestamps fall back to id ordering.
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
    assert_eq!(VideoRepo::count(&pool).await.unwrap(), 2);
}

#[sqlx::test]
async fn invalid_status_rejected_by_schema(pool: PgPool) {
    let video = seed_video(&pool, "bad.mp4").await;
    let result = VideoRepo::set_status(&pool, video.id, "paused").await;
    assert!(result.is_err());
}
