//! Repository for the `detections` and `attributes` tables.
//!
//! A frame's detections and their attribute rows are persisted in one
//! transaction; a frame is never partially visible to readers.

use sqlx::PgPool;
use vigil_core::confidence::AGGREGATE_CONFIDENCE_SQL;
use vigil_core::types::DbId;

use crate::models::attribute::CreateAttribute;
use crate::models::detection::{
    CreateDetection, Detection, DetectionSummary, DetectionWithAttributes, DistributionBucket,
};

/// Column list for `detections` SELECT queries.
const COLUMNS: &str = "\
    id, video_id, frame_number, timestamp_secs, \
    bbox_x, bbox_y, bbox_width, bbox_height, \
    detection_confidence, crop_path, created_at";

/// Joined detection + attribute columns, aliased for
/// [`DetectionWithAttributes`]. Requires `detections d LEFT JOIN
/// attributes a`.
fn joined_columns() -> String {
    format!(
        "d.id, d.video_id, d.frame_number, d.timestamp_secs, \
         d.bbox_x, d.bbox_y, d.bbox_width, d.bbox_height, \
         d.detection_confidence, d.crop_path, \
         a.upper_color, a.upper_color_confidence, \
         a.lower_color, a.lower_color_confidence, \
         a.gender, a.gender_confidence, \
         {AGGREGATE_CONFIDENCE_SQL} AS aggregate_confidence"
    )
}

/// Provides query operations for detections and their attributes.
pub struct DetectionRepo;

impl DetectionRepo {
    /// Persist one frame's detections and attributes atomically.
    ///
    /// Returns the inserted detection ids, in input order. An empty
    /// batch commits nothing and returns an empty vec.
    pub async fn insert_frame_batch(
        pool: &PgPool,
        rows: &[(CreateDetection, CreateAttribute)],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = pool.begin().await?;
        let mut ids = Vec::with_capacity(rows.len());

        for (detection, attribute) in rows {
            let query = format!(
                "INSERT INTO detections \
                 (video_id, frame_number, timestamp_secs, \
                  bbox_x, bbox_y, bbox_width, bbox_height, \
                  detection_confidence, crop_path) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 RETURNING {COLUMNS}"
            );
            let inserted = sqlx::query_as::<_, Detection>(&query)
                .bind(detection.video_id)
                .bind(detection.frame_number)
                .bind(detection.timestamp_secs)
                .bind(detection.bbox_x)
                .bind(detection.bbox_y)
                .bind(detection.bbox_width)
                .bind(detection.bbox_height)
                .bind(detection.detection_confidence)
                .bind(&detection.crop_path)
                .fetch_one(&mut *tx)
                .await?;

            sqlx::query(
                "INSERT INTO attributes \
                 (detection_id, upper_color, upper_color_confidence, \
                  lower_color, lower_color_confidence, gender, gender_confidence) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(inserted.id)
            .bind(&attribute.upper_color)
            .bind(attribute.upper_color_confidence)
            .bind(&attribute.lower_color)
            .bind(attribute.lower_color_confidence)
            .bind(&attribute.gender)
            .bind(attribute.gender_confidence)
            .execute(&mut *tx)
            .await?;

            ids.push(inserted.id);
        }

        tx.commit().await?;
        Ok(ids)
    }

    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<Detection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM detections WHERE id = $1");
        sqlx::query_as::<_, Detection>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn get_with_attributes(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<DetectionWithAttributes>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM detections d \
             LEFT JOIN attributes a ON a.detection_id = d.id \
             WHERE d.id = $1",
            joined_columns()
        );
        sqlx::query_as::<_, DetectionWithAttributes>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Detections of one video in frame order, optionally filtered by
    /// derived aggregate confidence.
    pub async fn list_for_video(
        pool: &PgPool,
        video_id: DbId,
        min_confidence: Option<f64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DetectionWithAttributes>, sqlx::Error> {
        let confidence_clause = if min_confidence.is_some() {
            format!("AND {AGGREGATE_CONFIDENCE_SQL} >= $4")
        } else {
            String::new()
        };
        let query = format!(
            "SELECT {} FROM detections d \
             LEFT JOIN attributes a ON a.detection_id = d.id \
             WHERE d.video_id = $1 {confidence_clause} \
             ORDER BY d.frame_number ASC, d.id ASC \
             LIMIT $2 OFFSET $3",
            joined_columns()
        );
        let mut q = sqlx::query_as::<_, DetectionWithAttributes>(&query)
            .bind(video_id)
            .bind(limit)
            .bind(offset);
        if let Some(min) = min_confidence {
            q = q.bind(min);
        }
        q.fetch_all(pool).await
    }

    pub async fn count_for_video(pool: &PgPool, video_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM detections WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(pool)
            .await
    }

    /// Highest frame number with a committed detection, if any.
    pub async fn last_frame_for_video(
        pool: &PgPool,
        video_id: DbId,
    ) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar("SELECT MAX(frame_number) FROM detections WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(pool)
            .await
    }

    /// Gender and color distributions for one video.
    pub async fn summary(pool: &PgPool, video_id: DbId) -> Result<DetectionSummary, sqlx::Error> {
        let totals: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(DISTINCT frame_number) \
             FROM detections WHERE video_id = $1",
        )
        .bind(video_id)
        .fetch_one(pool)
        .await?;

        Ok(DetectionSummary {
            video_id,
            total_detections: totals.0,
            frames_with_detections: totals.1,
            gender_distribution: Self::distribution(pool, video_id, "gender").await?,
            upper_color_distribution: Self::distribution(pool, video_id, "upper_color").await?,
            lower_color_distribution: Self::distribution(pool, video_id, "lower_color").await?,
        })
    }

    /// Count attribute values of one column for a video. `column` is a
    /// compile-time constant, never user input.
    async fn distribution(
        pool: &PgPool,
        video_id: DbId,
        column: &str,
    ) -> Result<Vec<DistributionBucket>, sqlx::Error> {
        let query = format!(
            "SELECT a.{column} AS value, COUNT(*)::BIGINT AS count \
             FROM detections d \
             JOIN attributes a ON a.detection_id = d.id \
             WHERE d.video_id = $1 AND a.{column} IS NOT NULL \
             GROUP BY a.{column} \
             ORDER BY count DESC, value ASC"
        );
        sqlx::query_as::<_, DistributionBucket>(&query)
            .bind(video_id)
            .fetch_all(pool)
            .await
    }
}
