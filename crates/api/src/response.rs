//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope per project conventions.
//! Use [`DataResponse`] instead of ad-hoc `serde_json::json!({ "data": ... })`
//! to get compile-time type safety and consistent serialization.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Paginated `{ "data": [...], "total": N }` envelope.
///
/// `total` is the match count before pagination, so clients can build
/// page controls from any page.
#[derive(Debug, Serialize)]
pub struct PageResponse<T: Serialize> {
    pub data: Vec<T>,
    pub total: i64,
}
