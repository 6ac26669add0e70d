//! Routes for the `/metrics` resource.
//!
//! ```text
//! /summary        GET system-wide aggregates
//! /videos         GET latest metric per video
//! /videos/{id}    GET latest metric for one video
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::metrics;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(metrics::summary))
        .route("/videos", get(metrics::per_video))
        .route("/videos/{id}", get(metrics::for_video))
}
