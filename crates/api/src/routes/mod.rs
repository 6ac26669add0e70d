pub mod alerts;
pub mod detections;
pub mod export;
pub mod health;
pub mod metrics;
pub mod search;
pub mod videos;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /videos                              list, upload (multipart)
/// /videos/{id}                         get, delete
/// /videos/{id}/process                 start processing run (POST)
/// /videos/{id}/status                  live or reconstructed progress (GET)
/// /videos/{id}/cancel                  cancel in-flight run (POST)
/// /videos/{id}/clip                    export sub-clip (GET, ?start&end)
/// /videos/{id}/detections              list detections (GET)
/// /videos/{id}/detections/summary      attribute distributions (GET)
///
/// /detections/{id}                     detection with attributes (GET)
/// /detections/{id}/crop                persisted crop image (GET)
/// /detections/{id}/frame               full source frame (GET)
///
/// /search/query                        natural-language search (POST)
/// /search/advanced                     structured attribute search (POST)
/// /search/history                      list (GET), clear all (DELETE)
/// /search/history/{id}                 delete one entry (DELETE)
///
/// /alerts                              list triggered alerts (GET)
/// /alerts/stats                        rule/alert counters (GET)
/// /alerts/read-all                     mark all read (POST)
/// /alerts/{id}/read                    mark read (POST)
/// /alerts/{id}/acknowledge             acknowledge (POST, requires identity)
/// /alerts/rules                        list, create (GET, POST)
/// /alerts/rules/{id}                   get, update, delete
///
/// /metrics/summary                     system-wide aggregates (GET)
/// /metrics/videos                      latest metric per video (GET)
/// /metrics/videos/{id}                 latest metric for one video (GET)
///
/// /export/detections                   export search results (?format=json|csv)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/videos", videos::router())
        .nest("/detections", detections::router())
        .nest("/search", search::router())
        .nest("/alerts", alerts::router())
        .nest("/metrics", metrics::router())
        .nest("/export", export::router())
}
