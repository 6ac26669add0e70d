//! Routes for the `/search` resource.
//!
//! ```text
//! /query          POST natural-language search
//! /advanced       POST structured attribute search
//! /history        GET list, DELETE clear all
//! /history/{id}   DELETE one entry
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::search;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/query", post(search::query))
        .route("/advanced", post(search::advanced))
        .route("/history", get(search::history).delete(search::clear_history))
        .route("/history/{id}", axum::routing::delete(search::delete_history))
}
