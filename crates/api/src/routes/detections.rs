//! Routes for the `/detections` resource.
//!
//! ```text
//! /{id}         GET detection with attributes
//! /{id}/crop    GET persisted crop image
//! /{id}/frame   GET full source frame at the detection's timestamp
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::detections;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(detections::get))
        .route("/{id}/crop", get(detections::crop))
        .route("/{id}/frame", get(detections::frame))
}
