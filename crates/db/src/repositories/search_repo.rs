//! Attribute search over persisted detections.
//!
//! All predicates are conjunctive. The derived aggregate confidence is
//! used for both the confidence filter and the confidence sort, so the
//! two can never disagree. The total count is computed before
//! pagination, and `detection_id` breaks ordering ties so repeated
//! queries return identical pages.

use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};
use vigil_core::confidence::{round3, AGGREGATE_CONFIDENCE_SQL};
use vigil_core::search::{
    clamp_limit, clamp_offset, SortBy, SortOrder, DEFAULT_MIN_CONFIDENCE, DEFAULT_SEARCH_LIMIT,
    MAX_SEARCH_LIMIT,
};

use crate::models::search::{SearchFilters, SearchResultItem};

const RESULT_COLUMNS: &str = "\
    d.id AS detection_id, d.video_id, v.filename AS video_filename, \
    d.frame_number, d.timestamp_secs, \
    d.bbox_x, d.bbox_y, d.bbox_width, d.bbox_height, d.crop_path, \
    a.upper_color, a.upper_color_confidence, \
    a.lower_color, a.lower_color_confidence, \
    a.gender, a.gender_confidence";

const FROM_CLAUSE: &str = "\
    FROM detections d \
    JOIN videos v ON v.id = d.video_id \
    LEFT JOIN attributes a ON a.detection_id = d.id";

/// Provides attribute search over detections.
pub struct SearchRepo;

impl SearchRepo {
    /// Execute a search: returns the requested page and the total match
    /// count (computed before pagination).
    pub async fn search(
        pool: &PgPool,
        filters: &SearchFilters,
    ) -> Result<(Vec<SearchResultItem>, i64), sqlx::Error> {
        let (where_clause, next_idx) = Self::build_where(filters);

        let count_query = format!("SELECT COUNT(*) {FROM_CLAUSE} {where_clause}");
        let total: i64 = Self::bind_filters(sqlx::query_as(&count_query), filters)
            .fetch_one(pool)
            .await
            .map(|(n,): (i64,)| n)?;

        let order = Self::order_clause(filters);
        let limit = clamp_limit(filters.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
        let offset = clamp_offset(filters.offset);
        let page_query = format!(
            "SELECT {RESULT_COLUMNS}, \
             {AGGREGATE_CONFIDENCE_SQL} AS aggregate_confidence \
             {FROM_CLAUSE} {where_clause} \
             ORDER BY {order} \
             LIMIT ${next_idx} OFFSET ${}",
            next_idx + 1
        );
        let mut items: Vec<SearchResultItem> =
            Self::bind_filters(sqlx::query_as(&page_query), filters)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?;

        for item in &mut items {
            item.aggregate_confidence = round3(item.aggregate_confidence);
        }
        Ok((items, total))
    }

    /// Same filters with the pagination limits replaced by a hard cap,
    /// for the export endpoint.
    pub async fn search_for_export(
        pool: &PgPool,
        filters: &SearchFilters,
        max_rows: i64,
    ) -> Result<Vec<SearchResultItem>, sqlx::Error> {
        let capped = SearchFilters {
            limit: Some(max_rows),
            offset: Some(0),
            ..filters.clone()
        };
        let (where_clause, next_idx) = Self::build_where(&capped);
        let order = Self::order_clause(&capped);
        let query = format!(
            "SELECT {RESULT_COLUMNS}, \
             {AGGREGATE_CONFIDENCE_SQL} AS aggregate_confidence \
             {FROM_CLAUSE} {where_clause} \
             ORDER BY {order} \
             LIMIT ${next_idx}"
        );
        let mut items: Vec<SearchResultItem> =
            Self::bind_filters(sqlx::query_as(&query), &capped)
                .bind(max_rows)
                .fetch_all(pool)
                .await?;
        for item in &mut items {
            item.aggregate_confidence = round3(item.aggregate_confidence);
        }
        Ok(items)
    }

    /// Build the WHERE clause; returns it plus the next free bind index.
    /// [`Self::bind_filters`] must bind values in exactly this order.
    fn build_where(filters: &SearchFilters) -> (String, usize) {
        let mut clauses: Vec<String> = Vec::new();
        let mut bind_idx = 1;

        if filters.gender.is_some() {
            clauses.push(format!("a.gender = ${bind_idx}"));
            bind_idx += 1;
        }
        if filters.upper_color.is_some() {
            clauses.push(format!("a.upper_color = ${bind_idx}"));
            bind_idx += 1;
        }
        if filters.lower_color.is_some() {
            clauses.push(format!("a.lower_color = ${bind_idx}"));
            bind_idx += 1;
        }
        if filters.video_id.is_some() {
            clauses.push(format!("d.video_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if filters.start_timestamp.is_some() {
            clauses.push(format!("d.timestamp_secs >= ${bind_idx}"));
            bind_idx += 1;
        }
        if filters.end_timestamp.is_some() {
            clauses.push(format!("d.timestamp_secs <= ${bind_idx}"));
            bind_idx += 1;
        }
        // The confidence filter is always applied (default 0.6).
        clauses.push(format!("{AGGREGATE_CONFIDENCE_SQL} >= ${bind_idx}"));
        bind_idx += 1;

        (format!("WHERE {}", clauses.join(" AND ")), bind_idx)
    }

    /// Bind filter values in the order [`Self::build_where`] numbered
    /// them.
    fn bind_filters<'q, O>(
        mut query: QueryAs<'q, Postgres, O, PgArguments>,
        filters: &'q SearchFilters,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        if let Some(gender) = &filters.gender {
            query = query.bind(gender);
        }
        if let Some(upper) = &filters.upper_color {
            query = query.bind(upper);
        }
        if let Some(lower) = &filters.lower_color {
            query = query.bind(lower);
        }
        if let Some(video_id) = filters.video_id {
            query = query.bind(video_id);
        }
        if let Some(start) = filters.start_timestamp {
            query = query.bind(start);
        }
        if let Some(end) = filters.end_timestamp {
            query = query.bind(end);
        }
        query.bind(filters.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE))
    }

    /// Sort expression plus `d.id` as the final tiebreaker.
    fn order_clause(filters: &SearchFilters) -> String {
        let order = filters.sort_order.unwrap_or_default().sql();
        let expr = match filters.sort_by.unwrap_or_default() {
            SortBy::Confidence => format!("{AGGREGATE_CONFIDENCE_SQL} {order}"),
            SortBy::Timestamp => format!("d.timestamp_secs {order}"),
        };
        format!("{expr}, d.id ASC")
    }
}
