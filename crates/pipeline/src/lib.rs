//! Video analytics pipeline: per-run orchestration, the in-process job
//! registry, progress reporting, and alert evaluation.

pub mod alerts;
pub mod media;
pub mod processor;
pub mod progress;
pub mod registry;
