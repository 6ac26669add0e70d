//! End-to-end orchestrator tests against a real database with scripted
//! extraction and inference.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use vigil_core::bbox::BBox;
use vigil_core::ffmpeg::{FfmpegError, VideoMetadata};
use vigil_db::models::video::{status, CreateVideo};
use vigil_db::repositories::alert_repo::AlertRepo;
use vigil_db::repositories::detection_repo::DetectionRepo;
use vigil_db::repositories::performance_metric_repo::PerformanceMetricRepo;
use vigil_db::repositories::video_repo::VideoRepo;
use vigil_ml::{AttributePrediction, FixtureSource};
use vigil_pipeline::media::FrameExtractor;
use vigil_pipeline::processor::{
    process_video, AttributeSource, PipelineConfig, PipelineError, RunStatus,
};
use vigil_pipeline::progress;

/// Extractor scripted for a 300-frame 30fps source; "extracted" frames
/// and crops are just empty files.
struct ScriptedExtractor {
    fail_probe: bool,
    fail_frames: Vec<i64>,
}

impl ScriptedExtractor {
    fn ok() -> Self {
        Self {
            fail_probe: false,
            fail_frames: Vec::new(),
        }
    }

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            fps: 30.0,
            total_frames: 300,
            width: 1920,
            height: 1080,
            duration_seconds: 10.0,
        }
    }
}

#[async_trait]
impl FrameExtractor for ScriptedExtractor {
    async fn probe(&self, video_path: &Path) -> Result<VideoMetadata, FfmpegError> {
        if self.fail_probe {
            return Err(FfmpegError::VideoNotFound(
                video_path.to_string_lossy().to_string(),
            ));
        }
        Ok(Self::metadata())
    }

    async fn extract_frame(
        &self,
        _video_path: &Path,
        output_path: &Path,
        timestamp_secs: f64,
    ) -> Result<(), FfmpegError> {
        let frame = (timestamp_secs * 30.0).round() as i64;
        if self.fail_frames.contains(&frame) {
            return Err(FfmpegError::ExecutionFailed {
                exit_code: Some(1),
                stderr: "scripted decode failure".to_string(),
            });
        }
        tokio::fs::write(output_path, b"").await?;
        Ok(())
    }

    async fn extract_crop(
        &self,
        _video_path: &Path,
        output_path: &Path,
        _timestamp_secs: f64,
        _bbox: &BBox,
    ) -> Result<(), FfmpegError> {
        tokio::fs::write(output_path, b"").await?;
        Ok(())
    }
}

fn person_bbox() -> BBox {
    BBox {
        x: 100,
        y: 200,
        width: 80,
        height: 160,
    }
}

fn female_prediction() -> AttributePrediction {
    AttributePrediction {
        upper_color: Some("red".to_string()),
        upper_color_confidence: Some(0.8),
        gender: Some("female".to_string()),
        gender_confidence: Some(0.9),
        ..Default::default()
    }
}

fn source_with(fixture: FixtureSource) -> AttributeSource {
    let fixture = Arc::new(fixture);
    AttributeSource {
        detector: fixture.clone(),
        classifier: fixture.clone(),
        segmenter: fixture,
    }
}

async fn seed_video(pool: &PgPool) -> i64 {
    VideoRepo::insert(
        pool,
        &CreateVideo {
            filename: "cam01.mp4".to_string(),
            file_path: "/nonexistent/cam01.mp4".to_string(),
            uploaded_by: None,
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../db/migrations")]
async fn completed_run_persists_rows_and_metric(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new(media.path());
    let video_id = seed_video(&pool).await;
    // 30 fps sampled at 2/s: frames 0, 15, 30, ... 285.
    let source = source_with(
        FixtureSource::new()
            .with_single(15, person_bbox(), 0.91)
            .with_single(30, person_bbox(), 0.84)
            .with_prediction(female_prediction()),
    );
    let (tx, rx) = progress::channel(video_id);

    let outcome = process_video(
        &pool,
        &config,
        &source,
        &ScriptedExtractor::ok(),
        video_id,
        &tx,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.processed_frames, 20);
    assert_eq!(outcome.skipped_frames, 0);
    assert_eq!(outcome.detection_count, 2);

    let video = VideoRepo::get(&pool, video_id).await.unwrap().unwrap();
    assert_eq!(video.processing_status, status::COMPLETED);
    assert_eq!(video.fps, Some(30.0));
    assert_eq!(video.total_frames, Some(300));
    assert_eq!(video.resolution.as_deref(), Some("1920x1080"));

    let detections = DetectionRepo::list_for_video(&pool, video_id, None, 50, 0)
        .await
        .unwrap();
    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0].frame_number, 15);
    assert_eq!(detections[0].gender.as_deref(), Some("female"));
    let crop = detections[0].crop_path.as_deref().unwrap();
    assert!(
        crop.ends_with(&format!("crops/{video_id}/frame_15_det_0.jpg")),
        "unexpected crop path {crop}"
    );
    assert!(tokio::fs::try_exists(crop).await.unwrap());

    let metric = PerformanceMetricRepo::latest_for_video(&pool, video_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(metric.total_detections, 2);
    assert!(metric.processing_time_seconds >= 0.0);
    // The fixture segmenter keeps the whole frame.
    assert_eq!(metric.area_reduction_percentage, Some(0.0));

    let last = rx.borrow().clone();
    assert_eq!(last.status, "completed");
    assert_eq!(last.progress_pct, 100.0);
    assert_eq!(last.detection_count, 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn matching_rule_fires_during_the_run(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new(media.path());
    let video_id = seed_video(&pool).await;
    AlertRepo::insert_rule(
        &pool,
        None,
        &vigil_db::models::alert::CreateAlertRule {
            name: "female watch".to_string(),
            description: None,
            gender: Some("female".to_string()),
            upper_color: None,
            lower_color: None,
            min_confidence: 0.7,
            is_active: true,
        },
    )
    .await
    .unwrap();
    let source = source_with(
        FixtureSource::new()
            .with_single(15, person_bbox(), 0.91)
            .with_prediction(female_prediction()),
    );
    let (tx, _rx) = progress::channel(video_id);

    process_video(
        &pool,
        &config,
        &source,
        &ScriptedExtractor::ok(),
        video_id,
        &tx,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let alerts = AlertRepo::list_triggered(&pool, false, false, 10, 0).await.unwrap();
    assert_eq!(alerts.len(), 1);
    // mean(0.8, 0.9) with the lower component missing.
    assert!((alerts[0].confidence_score - 0.85).abs() < 1e-9);
    assert!((alerts[0].timestamp_secs - 0.5).abs() < 1e-9);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_video_is_not_found(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let source = source_with(FixtureSource::new());
    let (tx, _rx) = progress::channel(999);

    let err = process_video(
        &pool,
        &PipelineConfig::new(media.path()),
        &source,
        &ScriptedExtractor::ok(),
        999,
        &tx,
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::VideoNotFound(999)));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn concurrent_claim_is_rejected(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let video_id = seed_video(&pool).await;
    assert!(VideoRepo::try_set_processing(&pool, video_id).await.unwrap());

    let source = source_with(FixtureSource::new());
    let (tx, _rx) = progress::channel(video_id);
    let err = process_video(
        &pool,
        &PipelineConfig::new(media.path()),
        &source,
        &ScriptedExtractor::ok(),
        video_id,
        &tx,
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::AlreadyProcessing(_)));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn probe_failure_marks_the_video_failed(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let video_id = seed_video(&pool).await;
    let source = source_with(FixtureSource::new());
    let (tx, rx) = progress::channel(video_id);

    let extractor = ScriptedExtractor {
        fail_probe: true,
        fail_frames: Vec::new(),
    };
    let err = process_video(
        &pool,
        &PipelineConfig::new(media.path()),
        &source,
        &extractor,
        video_id,
        &tx,
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::Probe(_)));

    let video = VideoRepo::get(&pool, video_id).await.unwrap().unwrap();
    assert_eq!(video.processing_status, status::FAILED);
    // The error text is persisted on the row, not just emitted.
    assert_eq!(video.error_message.as_deref(), Some(err.to_string().as_str()));
    let last = rx.borrow().clone();
    assert_eq!(last.status, "failed");
    assert!(last.message.is_some());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn cancellation_is_observed_before_work(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let video_id = seed_video(&pool).await;
    let source = source_with(
        FixtureSource::new()
            .with_single(15, person_bbox(), 0.9)
            .with_prediction(female_prediction()),
    );
    let (tx, rx) = progress::channel(video_id);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = process_video(
        &pool,
        &PipelineConfig::new(media.path()),
        &source,
        &ScriptedExtractor::ok(),
        video_id,
        &tx,
        &cancel,
    )
    .await
    .unwrap();

    assert_eq!(outcome.status, RunStatus::Cancelled);
    assert_eq!(outcome.detection_count, 0);
    let video = VideoRepo::get(&pool, video_id).await.unwrap().unwrap();
    assert_eq!(video.processing_status, status::CANCELLED);
    // Metadata was still persisted before the cancellation point.
    assert_eq!(video.fps, Some(30.0));
    assert_eq!(rx.borrow().status, "cancelled");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn frame_failures_are_skipped_not_fatal(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let video_id = seed_video(&pool).await;
    let source = source_with(
        FixtureSource::new()
            .with_single(15, person_bbox(), 0.9)
            .with_single(30, person_bbox(), 0.9)
            .with_prediction(female_prediction()),
    );
    let (tx, _rx) = progress::channel(video_id);

    let extractor = ScriptedExtractor {
        fail_probe: false,
        fail_frames: vec![15],
    };
    let outcome = process_video(
        &pool,
        &PipelineConfig::new(media.path()),
        &source,
        &extractor,
        video_id,
        &tx,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.skipped_frames, 1);
    assert_eq!(outcome.processed_frames, 19);
    // Only the frame-30 detection survives.
    let detections = DetectionRepo::list_for_video(&pool, video_id, None, 50, 0)
        .await
        .unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].frame_number, 30);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn degenerate_candidates_are_dropped(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let video_id = seed_video(&pool).await;
    // Zero-width candidate; clamping leaves nothing.
    let degenerate = BBox {
        x: 100,
        y: 200,
        width: 0,
        height: 160,
    };
    let source = source_with(
        FixtureSource::new()
            .with_single(15, degenerate, 0.9)
            .with_prediction(female_prediction()),
    );
    let (tx, _rx) = progress::channel(video_id);

    let outcome = process_video(
        &pool,
        &PipelineConfig::new(media.path()),
        &source,
        &ScriptedExtractor::ok(),
        video_id,
        &tx,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.detection_count, 0);
    assert_eq!(
        DetectionRepo::count_for_video(&pool, video_id).await.unwrap(),
        0
    );
}
