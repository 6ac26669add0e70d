//! HTTP surface: a thin axum layer over the repositories and the
//! processing pipeline. Handlers validate, delegate, and shape
//! responses; no domain logic lives here.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
