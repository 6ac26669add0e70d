//! Repository for the `performance_metrics` table.

use sqlx::PgPool;
use vigil_core::types::DbId;

use crate::models::performance_metric::{
    CreatePerformanceMetric, MetricsSummary, PerformanceMetric, VideoMetricRow,
};

/// Column list for `performance_metrics` SELECT queries.
const COLUMNS: &str = "\
    id, video_id, avg_fps, total_detections, processing_time_seconds, \
    area_reduction_percentage, recorded_at";

/// Provides query operations for performance metrics.
pub struct PerformanceMetricRepo;

impl PerformanceMetricRepo {
    /// Record a processing run's metrics. Append-only.
    pub async fn insert(
        pool: &PgPool,
        metric: &CreatePerformanceMetric,
    ) -> Result<PerformanceMetric, sqlx::Error> {
        let query = format!(
            "INSERT INTO performance_metrics \
             (video_id, avg_fps, total_detections, processing_time_seconds, \
              area_reduction_percentage) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PerformanceMetric>(&query)
            .bind(metric.video_id)
            .bind(metric.avg_fps)
            .bind(metric.total_detections)
            .bind(metric.processing_time_seconds)
            .bind(metric.area_reduction_percentage)
            .fetch_one(pool)
            .await
    }

    /// Latest metric for a video, if any run has completed.
    pub async fn latest_for_video(
        pool: &PgPool,
        video_id: DbId,
    ) -> Result<Option<PerformanceMetric>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM performance_metrics \
             WHERE video_id = $1 \
             ORDER BY recorded_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, PerformanceMetric>(&query)
            .bind(video_id)
            .fetch_optional(pool)
            .await
    }

    /// System-wide totals and averages for the summary endpoint.
    pub async fn summary(pool: &PgPool) -> Result<MetricsSummary, sqlx::Error> {
        sqlx::query_as::<_, MetricsSummary>(
            "SELECT \
                (SELECT COUNT(*) FROM videos) AS total_videos, \
                (SELECT COUNT(*) FROM videos WHERE processing_status = 'completed') \
                    AS completed_videos, \
                (SELECT COUNT(*) FROM detections) AS total_detections, \
                COALESCE(SUM(processing_time_seconds), 0)::FLOAT8 \
                    AS total_processing_time_seconds, \
                COALESCE(AVG(avg_fps), 0)::FLOAT8 AS avg_processing_fps \
             FROM performance_metrics",
        )
        .fetch_one(pool)
        .await
    }

    /// Most recent metric per video, joined with the video row.
    pub async fn per_video(pool: &PgPool, limit: i64) -> Result<Vec<VideoMetricRow>, sqlx::Error> {
        sqlx::query_as::<_, VideoMetricRow>(
            "SELECT DISTINCT ON (m.video_id) \
                m.video_id, v.filename, v.processing_status, \
                m.avg_fps, m.total_detections, m.processing_time_seconds, \
                m.area_reduction_percentage, m.recorded_at \
             FROM performance_metrics m \
             JOIN videos v ON v.id = m.video_id \
             ORDER BY m.video_id, m.recorded_at DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
