//! Per-video processing orchestrator.
//!
//! Drives one video through `uploaded → processing → {completed |
//! failed | cancelled}`: probe, sample, detect, crop, classify, persist
//! frame-by-frame, evaluate alerts, and record the run's performance
//! metric. Cancellation is observed between frames; committed work is
//! always retained.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use sqlx::PgPool;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use vigil_core::alert::AttributeValues;
use vigil_core::confidence::aggregate_confidence;
use vigil_core::error::CoreError;
use vigil_core::ffmpeg::FfmpegError;
use vigil_core::sampling::{sampled_frames, sampling_interval, TARGET_SAMPLES_PER_SEC};
use vigil_core::types::DbId;
use vigil_ml::{AttributeClassifier, AttributePrediction, Detector, Frame, Segmenter};
use vigil_db::models::attribute::CreateAttribute;
use vigil_db::models::detection::CreateDetection;
use vigil_db::models::performance_metric::CreatePerformanceMetric;
use vigil_db::models::video::{status, Video, VideoTechMetadata};
use vigil_db::repositories::detection_repo::DetectionRepo;
use vigil_db::repositories::performance_metric_repo::PerformanceMetricRepo;
use vigil_db::repositories::video_repo::VideoRepo;

use crate::alerts::AlertEvaluator;
use crate::media::FrameExtractor;
use crate::progress::{self, ProgressUpdate};

/// Error type for processing runs.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("video {0} not found")]
    VideoNotFound(DbId),

    #[error("video {0} is already being processed")]
    AlreadyProcessing(DbId),

    #[error("source not processable: {0}")]
    InvalidSource(String),

    #[error("probe failed: {0}")]
    Probe(#[from] FfmpegError),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline filesystem and sampling configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root under which `frames/{video_id}` and `crops/{video_id}` live.
    pub media_root: PathBuf,
    /// Target sampled frames per second of footage.
    pub target_sample_rate: f64,
}

impl PipelineConfig {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
            target_sample_rate: TARGET_SAMPLES_PER_SEC,
        }
    }

    pub fn crops_dir(&self, video_id: DbId) -> PathBuf {
        self.media_root.join("crops").join(video_id.to_string())
    }

    pub fn frames_dir(&self, video_id: DbId) -> PathBuf {
        self.media_root.join("frames").join(video_id.to_string())
    }
}

/// The three inference backends a run uses.
#[derive(Clone)]
pub struct AttributeSource {
    pub detector: Arc<dyn Detector>,
    pub classifier: Arc<dyn AttributeClassifier>,
    pub segmenter: Arc<dyn Segmenter>,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// Summary of a finished (or cancelled) run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub processed_frames: i64,
    pub skipped_frames: i64,
    pub detection_count: i64,
    pub elapsed_seconds: f64,
}

/// Process one video end to end.
///
/// On unrecoverable errors the video is marked `failed`, a final update
/// carrying the message is emitted, and the error is propagated.
pub async fn process_video(
    pool: &PgPool,
    config: &PipelineConfig,
    source: &AttributeSource,
    extractor: &dyn FrameExtractor,
    video_id: DbId,
    sender: &watch::Sender<ProgressUpdate>,
    cancel: &CancellationToken,
) -> Result<RunOutcome, PipelineError> {
    let video = VideoRepo::get(pool, video_id)
        .await?
        .ok_or(PipelineError::VideoNotFound(video_id))?;

    // Claim the row; losing the guarded UPDATE means another run holds it.
    if !VideoRepo::try_set_processing(pool, video_id).await? {
        return Err(PipelineError::AlreadyProcessing(video_id));
    }

    match run(pool, config, source, extractor, &video, sender, cancel).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            tracing::error!(video_id, error = %e, "Processing run failed");
            VideoRepo::set_failed(pool, video_id, &e.to_string()).await?;
            progress::emit(sender, ProgressUpdate::failed(video_id, e.to_string()));
            Err(e)
        }
    }
}

async fn run(
    pool: &PgPool,
    config: &PipelineConfig,
    source: &AttributeSource,
    extractor: &dyn FrameExtractor,
    video: &Video,
    sender: &watch::Sender<ProgressUpdate>,
    cancel: &CancellationToken,
) -> Result<RunOutcome, PipelineError> {
    let started = Instant::now();
    let video_path = Path::new(&video.file_path);

    // Probe and persist metadata before any detection work, so partial
    // runs still carry correct fps and frame counts.
    let metadata = extractor.probe(video_path).await?;
    if !(metadata.fps.is_finite() && metadata.fps > 0.0) {
        return Err(PipelineError::InvalidSource(format!(
            "unusable framerate {}",
            metadata.fps
        )));
    }
    if metadata.total_frames <= 0 {
        return Err(PipelineError::InvalidSource(
            "source reports no frames".to_string(),
        ));
    }
    VideoRepo::set_metadata(
        pool,
        video.id,
        &VideoTechMetadata {
            fps: metadata.fps as f32,
            total_frames: metadata.total_frames as i32,
            resolution: format!("{}x{}", metadata.width, metadata.height),
            duration_seconds: metadata.duration_seconds,
        },
    )
    .await?;

    let interval = sampling_interval(metadata.fps, config.target_sample_rate)
        .map_err(|e: CoreError| PipelineError::InvalidSource(e.to_string()))?;
    let total_frames = metadata.total_frames;

    let rules = AlertEvaluator::active_rules(pool).await?;
    let frames_dir = config.frames_dir(video.id);
    let crops_dir = config.crops_dir(video.id);
    tokio::fs::create_dir_all(&frames_dir).await?;
    tokio::fs::create_dir_all(&crops_dir).await?;

    tracing::info!(
        video_id = video.id,
        fps = metadata.fps,
        total_frames,
        interval,
        "Starting processing run",
    );

    let mut processed_frames: i64 = 0;
    let mut skipped_frames: i64 = 0;
    let mut detection_count: i64 = 0;
    let mut area_reduction: Option<f64> = None;

    for frame_number in sampled_frames(total_frames, interval) {
        if cancel.is_cancelled() {
            tracing::info!(video_id = video.id, frame_number, "Run cancelled");
            VideoRepo::set_status(pool, video.id, status::CANCELLED).await?;
            progress::emit(
                sender,
                ProgressUpdate::cancelled(video.id, frame_number, total_frames),
            );
            return Ok(RunOutcome {
                status: RunStatus::Cancelled,
                processed_frames,
                skipped_frames,
                detection_count,
                elapsed_seconds: started.elapsed().as_secs_f64(),
            });
        }

        let timestamp_secs = frame_number as f64 / metadata.fps;
        let frame_path = frames_dir.join(format!("frame_{frame_number}.jpg"));
        if let Err(e) = extractor
            .extract_frame(video_path, &frame_path, timestamp_secs)
            .await
        {
            // An individual frame failure is skipped and counted, not fatal.
            tracing::warn!(video_id = video.id, frame_number, error = %e, "Frame extraction failed; skipping");
            skipped_frames += 1;
            continue;
        }

        let frame = Frame {
            index: frame_number,
            width: metadata.width,
            height: metadata.height,
            image_path: frame_path,
        };

        if area_reduction.is_none() {
            // Best-effort; the metric column is nullable.
            match source.segmenter.generate_mask(&frame).await {
                Ok(mask) => area_reduction = Some(mask.area_reduction_pct()),
                Err(e) => {
                    tracing::debug!(video_id = video.id, error = %e, "Segmentation unavailable")
                }
            }
        }

        let candidates = match source.detector.detect(&frame).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(video_id = video.id, frame_number, error = %e, "Detection failed; skipping frame");
                skipped_frames += 1;
                continue;
            }
        };

        let mut rows: Vec<(CreateDetection, CreateAttribute)> = Vec::new();
        let mut evaluations: Vec<(AttributeValues, f64)> = Vec::new();
        for (idx, candidate) in candidates.iter().enumerate() {
            let Some(bbox) = candidate.bbox.clamp_to_frame(metadata.width, metadata.height)
            else {
                continue; // degenerate after clamping
            };

            let crop_path = crops_dir.join(format!("frame_{frame_number}_det_{idx}.jpg"));
            if let Err(e) = extractor
                .extract_crop(video_path, &crop_path, timestamp_secs, &bbox)
                .await
            {
                tracing::warn!(video_id = video.id, frame_number, idx, error = %e, "Crop extraction failed; dropping candidate");
                continue;
            }

            let prediction = match source.classifier.classify(&crop_path).await {
                Ok(prediction) => prediction,
                Err(e) => {
                    tracing::warn!(video_id = video.id, frame_number, idx, error = %e, "Classification failed; dropping candidate");
                    continue;
                }
            };

            let aggregate = aggregate_confidence(
                prediction.upper_color_confidence,
                prediction.lower_color_confidence,
                prediction.gender_confidence,
            );
            evaluations.push((
                AttributeValues {
                    gender: prediction.gender.clone(),
                    upper_color: prediction.upper_color.clone(),
                    lower_color: prediction.lower_color.clone(),
                },
                aggregate,
            ));
            rows.push((
                CreateDetection {
                    video_id: video.id,
                    frame_number: frame_number as i32,
                    timestamp_secs,
                    bbox_x: bbox.x,
                    bbox_y: bbox.y,
                    bbox_width: bbox.width,
                    bbox_height: bbox.height,
                    detection_confidence: candidate.confidence,
                    crop_path: Some(crop_path.to_string_lossy().into_owned()),
                },
                prediction_to_attribute(&prediction),
            ));
        }

        // One transaction per frame; a frame is never partially visible.
        let ids = DetectionRepo::insert_frame_batch(pool, &rows).await?;
        detection_count += ids.len() as i64;

        for (detection_id, (attribute, aggregate)) in ids.iter().zip(evaluations.iter()) {
            AlertEvaluator::evaluate_detection(
                pool,
                &rules,
                video.id,
                *detection_id,
                timestamp_secs,
                attribute,
                *aggregate,
            )
            .await?;
        }

        processed_frames += 1;
        progress::emit(
            sender,
            ProgressUpdate::processing(video.id, frame_number, total_frames, detection_count),
        );
    }

    let elapsed_seconds = started.elapsed().as_secs_f64();
    let avg_fps = if elapsed_seconds > 0.0 {
        processed_frames as f64 / elapsed_seconds
    } else {
        0.0
    };
    PerformanceMetricRepo::insert(
        pool,
        &CreatePerformanceMetric {
            video_id: video.id,
            avg_fps,
            total_detections: detection_count as i32,
            processing_time_seconds: elapsed_seconds,
            area_reduction_percentage: area_reduction,
        },
    )
    .await?;
    VideoRepo::set_status(pool, video.id, status::COMPLETED).await?;
    progress::emit(
        sender,
        ProgressUpdate::completed(video.id, total_frames, detection_count),
    );
    tracing::info!(
        video_id = video.id,
        processed_frames,
        skipped_frames,
        detection_count,
        elapsed_seconds,
        "Processing run completed",
    );

    Ok(RunOutcome {
        status: RunStatus::Completed,
        processed_frames,
        skipped_frames,
        detection_count,
        elapsed_seconds,
    })
}

fn prediction_to_attribute(prediction: &AttributePrediction) -> CreateAttribute {
    CreateAttribute {
        upper_color: prediction.upper_color.clone(),
        upper_color_confidence: prediction.upper_color_confidence,
        lower_color: prediction.lower_color.clone(),
        lower_color_confidence: prediction.lower_color_confidence,
        gender: prediction.gender.clone(),
        gender_confidence: prediction.gender_confidence,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
