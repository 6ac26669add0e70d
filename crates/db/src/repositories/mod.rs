//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod alert_repo;
pub mod detection_repo;
pub mod performance_metric_repo;
pub mod search_history_repo;
pub mod search_repo;
pub mod video_repo;
