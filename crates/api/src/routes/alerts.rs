//! Routes for the `/alerts` resource.
//!
//! ```text
//! /                     GET list triggered alerts
//! /stats                GET rule/alert counters
//! /read-all             POST mark all read
//! /{id}/read            POST mark one read
//! /{id}/acknowledge     POST acknowledge (requires identity)
//! /rules                GET list, POST create
//! /rules/{id}           GET, PUT, DELETE
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::alerts;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(alerts::list_triggered))
        .route("/stats", get(alerts::stats))
        .route("/read-all", post(alerts::read_all))
        .route("/{id}/read", post(alerts::mark_read))
        .route("/{id}/acknowledge", post(alerts::acknowledge))
        .route("/rules", get(alerts::list_rules).post(alerts::create_rule))
        .route(
            "/rules/{id}",
            get(alerts::get_rule)
                .put(alerts::update_rule)
                .delete(alerts::delete_rule),
        )
}
