use std::sync::Arc;

use sqlx::PgPool;
use vigil_pipeline::media::FrameExtractor;
use vigil_pipeline::processor::{AttributeSource, PipelineConfig};
use vigil_pipeline::registry::JobRegistry;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: PgPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// In-process registry of in-flight processing runs.
    pub registry: Arc<JobRegistry>,
    /// Pipeline filesystem and sampling configuration.
    pub pipeline: PipelineConfig,
    /// Inference backends handed to each processing run.
    pub source: AttributeSource,
    /// Frame/crop extraction backend (ffmpeg in production).
    pub extractor: Arc<dyn FrameExtractor>,
}
