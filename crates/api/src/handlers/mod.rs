//! Request handlers, grouped by resource.

pub mod alerts;
pub mod detections;
pub mod export;
pub mod metrics;
pub mod search;
pub mod videos;
