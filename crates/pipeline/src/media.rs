//! Frame/crop extraction seam between the orchestrator and ffmpeg.
//!
//! The orchestrator only depends on this trait; production uses
//! [`FfmpegExtractor`], tests substitute a scripted implementation so
//! pipeline behavior can be exercised without media files.

use std::path::Path;

use async_trait::async_trait;
use vigil_core::bbox::BBox;
use vigil_core::ffmpeg::{self, FfmpegError, VideoMetadata};

#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Probe the source's technical metadata.
    async fn probe(&self, video_path: &Path) -> Result<VideoMetadata, FfmpegError>;

    /// Extract one full frame as a JPEG at the given timestamp.
    async fn extract_frame(
        &self,
        video_path: &Path,
        output_path: &Path,
        timestamp_secs: f64,
    ) -> Result<(), FfmpegError>;

    /// Extract the bbox region of one frame as a JPEG. The bbox is
    /// already clamped to frame bounds.
    async fn extract_crop(
        &self,
        video_path: &Path,
        output_path: &Path,
        timestamp_secs: f64,
        bbox: &BBox,
    ) -> Result<(), FfmpegError>;
}

/// Production extractor shelling out to ffmpeg/ffprobe.
pub struct FfmpegExtractor;

#[async_trait]
impl FrameExtractor for FfmpegExtractor {
    async fn probe(&self, video_path: &Path) -> Result<VideoMetadata, FfmpegError> {
        ffmpeg::probe_metadata(video_path).await
    }

    async fn extract_frame(
        &self,
        video_path: &Path,
        output_path: &Path,
        timestamp_secs: f64,
    ) -> Result<(), FfmpegError> {
        ffmpeg::extract_frame(video_path, output_path, timestamp_secs).await
    }

    async fn extract_crop(
        &self,
        video_path: &Path,
        output_path: &Path,
        timestamp_secs: f64,
        bbox: &BBox,
    ) -> Result<(), FfmpegError> {
        ffmpeg::extract_crop(
            video_path,
            output_path,
            timestamp_secs,
            bbox.x,
            bbox.y,
            bbox.width,
            bbox.height,
        )
        .await
    }
}
