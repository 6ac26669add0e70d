//! Repository for the `videos` table.

use sqlx::PgPool;
use vigil_core::types::DbId;

use crate::models::video::{status, CreateVideo, Video, VideoTechMetadata};

/// Column list for `videos` SELECT queries.
const COLUMNS: &str = "\
    id, filename, file_path, fps, total_frames, resolution, duration_seconds, \
    processing_status, error_message, uploaded_by, created_at, updated_at";

/// Provides query operations for videos.
pub struct VideoRepo;

impl VideoRepo {
    /// Register an uploaded video in `uploaded` state.
    pub async fn insert(pool: &PgPool, video: &CreateVideo) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos (filename, file_path, uploaded_by) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(&video.filename)
            .bind(&video.file_path)
            .bind(video.uploaded_by)
            .fetch_one(pool)
            .await
    }

    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM videos ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Persist probed technical metadata. Done before any detection work
    /// so partial runs still carry correct fps/frame counts.
    pub async fn set_metadata(
        pool: &PgPool,
        id: DbId,
        metadata: &VideoTechMetadata,
    ) -> Result<Video, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET fps = $2, total_frames = $3, resolution = $4, \
             duration_seconds = $5, updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(metadata.fps)
            .bind(metadata.total_frames)
            .bind(&metadata.resolution)
            .bind(metadata.duration_seconds)
            .fetch_one(pool)
            .await
    }

    /// Claim a video for processing. The guarded UPDATE only succeeds
    /// when the row is not already `processing`, so two racing runs
    /// cannot both claim it. Returns `false` when the claim was lost.
    /// A fresh claim clears any error text left by an earlier run.
    pub async fn try_set_processing(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET processing_status = $2, error_message = NULL, \
             updated_at = now() \
             WHERE id = $1 AND processing_status <> $2",
        )
        .bind(id)
        .bind(status::PROCESSING)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Move a video to a terminal status.
    pub async fn set_status(pool: &PgPool, id: DbId, new_status: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE videos SET processing_status = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(new_status)
            .execute(pool)
            .await
            .map(|_| ())
    }

    /// Mark a run as failed, keeping the error text so status queries can
    /// report it after the live job is gone.
    pub async fn set_failed(pool: &PgPool, id: DbId, message: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE videos SET processing_status = $2, error_message = $3, \
             updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status::FAILED)
        .bind(message)
        .execute(pool)
        .await
        .map(|_| ())
    }

    /// Delete a video row; detections, attributes, metrics, and alerts
    /// cascade at the schema level.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM videos")
            .fetch_one(pool)
            .await
    }
}
