//! Search constants, pagination clamps, and sort-spec parsing.
//!
//! Lives in `core` (zero internal deps) so the repository layer and the
//! API share one definition of limits and sort semantics.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default number of search results per page.
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;

/// Maximum number of search results per page.
pub const MAX_SEARCH_LIMIT: i64 = 200;

/// Default minimum aggregate confidence for search queries.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;

/// Hard cap for export queries, independent of normal pagination limits.
pub const EXPORT_MAX_ROWS: i64 = 10_000;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Sort specification
// ---------------------------------------------------------------------------

/// Field a search result page can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Confidence,
    Timestamp,
}

impl SortBy {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "confidence" => Ok(SortBy::Confidence),
            "timestamp" => Ok(SortBy::Timestamp),
            other => Err(CoreError::Validation(format!(
                "Invalid sort field '{other}' (expected 'confidence' or 'timestamp')"
            ))),
        }
    }
}

impl Default for SortBy {
    fn default() -> Self {
        SortBy::Confidence
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(CoreError::Validation(format!(
                "Invalid sort order '{other}' (expected 'asc' or 'desc')"
            ))),
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
