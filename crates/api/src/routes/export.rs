//! Routes for the `/export` resource.
//!
//! ```text
//! /detections    GET export filtered search results (?format=json|csv)
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::export;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/detections", get(export::detections))
}
