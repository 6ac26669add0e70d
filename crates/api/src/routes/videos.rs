//! Routes for the `/videos` resource.
//!
//! ```text
//! /                          GET list, POST upload (multipart)
//! /{id}                      GET get, DELETE delete
//! /{id}/process              POST start processing run
//! /{id}/status               GET live or reconstructed progress
//! /{id}/cancel               POST cancel in-flight run
//! /{id}/clip                 GET export sub-clip (?start&end)
//! /{id}/detections           GET list detections
//! /{id}/detections/summary   GET attribute distributions
//! ```

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{detections, videos};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(videos::list).post(videos::upload))
        // The upload size cap comes from config and is enforced in the
        // handler, not by axum's default 2 MB body limit.
        .layer(DefaultBodyLimit::disable())
        .route("/{id}", get(videos::get).delete(videos::delete))
        .route("/{id}/process", post(videos::process))
        .route("/{id}/status", get(videos::status))
        .route("/{id}/cancel", post(videos::cancel))
        .route("/{id}/clip", get(videos::clip))
        .route("/{id}/detections", get(detections::list_for_video))
        .route("/{id}/detections/summary", get(detections::summary))
}
