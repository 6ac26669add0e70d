//! Shared seed helpers for repository tests.

use sqlx::PgPool;
use vigil_core::types::DbId;
use vigil_db::models::attribute::CreateAttribute;
use vigil_db::models::detection::CreateDetection;
use vigil_db::models::video::{CreateVideo, Video, VideoTechMetadata};
use vigil_db::repositories::detection_repo::DetectionRepo;
use vigil_db::repositories::video_repo::VideoRepo;

pub async fn seed_video(pool: &PgPool, filename: &str) -> Video {
    let video = VideoRepo::insert(
        pool,
        &CreateVideo {
            filename: filename.to_string(),
            file_path: format!("/data/uploads/{filename}"),
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

pub fn detection_at(video_id: DbId, frame: i32, x: i32, confidence: f64) -> CreateDetection {
    CreateDetection {
        video_id,
        frame_number: frame,
        timestamp_secs: frame as f64 / 30.0,
        bbox_x: x,
        bbox_y: 40,
        bbox_width: 80,
        bbox_height: 160,
        detection_confidence: confidence,
        crop_path: Some(format!("/data/crops/{video_id}/frame_{frame}_det_0.jpg")),
    }
}

pub fn attribute(
    gender: &str,
    gender_conf: f64,
    upper: &str,
    upper_conf: f64,
) -> CreateAttribute {
    CreateAttribute {
        upper_color: Some(upper.to_string()),
        upper_color_confidence: Some(upper_conf),
        lower_color: None,
        lower_color_confidence: None,
        gender: Some(gender.to_string()),
        gender_confidence: Some(gender_conf),
    }
}

/// Insert one detection + attribute pair, returning the detection id.
pub async fn seed_detection(
    pool: &PgPool,
    detection: CreateDetection,
    attr: CreateAttribute,
) -> DbId {
    let ids = DetectionRepo::insert_frame_batch(pool, &[(detection, attr)])
        .await
        .unwrap();
    ids[0]
}
