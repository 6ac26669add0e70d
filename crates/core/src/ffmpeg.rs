//! FFmpeg/FFprobe subprocess utilities.
//!
//! All frame-accurate video work (metadata probing, sampled-frame
//! extraction, person-crop extraction, sub-clip export) goes through
//! these wrappers; nothing else in the workspace shells out to ffmpeg.

use std::path::Path;

use serde::Deserialize;

/// Error type for FFmpeg/FFprobe operations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffprobe/ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe/ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("video file not found: {0}")]
    VideoNotFound(String),
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    pub streams: Vec<FfprobeStream>,
    pub format: FfprobeFormat,
}

/// A single stream from ffprobe output.
#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub index: i32,
    pub codec_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// e.g. "30/1" or "24000/1001"
    pub r_frame_rate: Option<String>,
    pub duration: Option<String>,
    pub nb_frames: Option<String>,
}

/// Format-level metadata from ffprobe.
#[derive(Debug, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
}

/// Technical metadata of a video source, as persisted on the video row.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VideoMetadata {
    pub fps: f64,
    pub total_frames: i64,
    pub width: i32,
    pub height: i32,
    pub duration_seconds: f64,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run `ffprobe` on a video file and return the parsed JSON output.
pub async fn probe_video(path: &Path) -> Result<FfprobeOutput, FfmpegError> {
    if !path.exists() {
        return Err(FfmpegError::VideoNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let output = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str::<FfprobeOutput>(&stdout)
        .map_err(|e| FfmpegError::ParseError(format!("{e}: {stdout}")))
}

/// Probe a video and assemble the metadata the pipeline persists.
pub async fn probe_metadata(path: &Path) -> Result<VideoMetadata, FfmpegError> {
    let probe = probe_video(path).await?;
    let (width, height) = parse_resolution(&probe);
    Ok(VideoMetadata {
        fps: parse_framerate(&probe),
        total_frames: parse_total_frames(&probe),
        width,
        height,
        duration_seconds: parse_duration(&probe),
    })
}

/// Extract a single full-resolution frame as a JPEG at the given timestamp.
pub async fn extract_frame(
    video_path: &Path,
    output_path: &Path,
    timestamp_secs: f64,
) -> Result<(), FfmpegError> {
    run_ffmpeg(video_path, |cmd| {
        cmd.args(["-y", "-ss", &format!("{timestamp_secs:.3}"), "-i"])
            .arg(video_path)
            .args(["-vframes", "1", "-q:v", "2"])
            .arg(output_path);
    })
    .await
}

/// Extract a cropped region of a single frame (a person crop) as a JPEG.
///
/// Coordinates must already be clamped to frame bounds; ffmpeg's `crop`
/// filter fails on out-of-range rectangles.
pub async fn extract_crop(
    video_path: &Path,
    output_path: &Path,
    timestamp_secs: f64,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) -> Result<(), FfmpegError> {
    run_ffmpeg(video_path, |cmd| {
        cmd.args(["-y", "-ss", &format!("{timestamp_secs:.3}"), "-i"])
            .arg(video_path)
            .args([
                "-vframes",
                "1",
                "-vf",
                &format!("crop={width}:{height}:{x}:{y}"),
                "-q:v",
                "2",
            ])
            .arg(output_path);
    })
    .await
}

/// Export a playable sub-clip covering `[start_secs, end_secs]`.
///
/// Streams are copied without re-encoding; the cut lands on the nearest
/// preceding keyframe, which is acceptable for review tooling.
pub async fn extract_clip(
    video_path: &Path,
    output_path: &Path,
    start_secs: f64,
    end_secs: f64,
) -> Result<(), FfmpegError> {
    let duration = (end_secs - start_secs).max(0.0);
    run_ffmpeg(video_path, |cmd| {
        cmd.args(["-y", "-ss", &format!("{start_secs:.3}"), "-i"])
            .arg(video_path)
            .args(["-t", &format!("{duration:.3}"), "-c", "copy"])
            .arg(output_path);
    })
    .await
}

/// Shared ffmpeg invocation: existence check, spawn, exit-status mapping.
async fn run_ffmpeg<F>(video_path: &Path, configure: F) -> Result<(), FfmpegError>
where
    F: FnOnce(&mut tokio::process::Command),
{
    if !video_path.exists() {
        return Err(FfmpegError::VideoNotFound(
            video_path.to_string_lossy().to_string(),
        ));
    }

    let mut cmd = tokio::process::Command::new("ffmpeg");
    configure(&mut cmd);

    let output = cmd.output().await.map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Find the first video stream in the ffprobe output.
fn first_video_stream(probe: &FfprobeOutput) -> Option<&FfprobeStream> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Parse the video duration in seconds from ffprobe output.
pub fn parse_duration(probe: &FfprobeOutput) -> f64 {
    // Try format-level duration first.
    if let Some(d) = &probe.format.duration {
        if let Ok(secs) = d.parse::<f64>() {
            return secs;
        }
    }
    // Fall back to the first video stream's duration.
    if let Some(stream) = first_video_stream(probe) {
        if let Some(d) = &stream.duration {
            if let Ok(secs) = d.parse::<f64>() {
                return secs;
            }
        }
    }
    0.0
}

/// Parse the video framerate from ffprobe output.
///
/// The `r_frame_rate` field is a fraction like `"30/1"` or `"24000/1001"`.
pub fn parse_framerate(probe: &FfprobeOutput) -> f64 {
    first_video_stream(probe)
        .and_then(|s| s.r_frame_rate.as_deref())
        .map(parse_fraction)
        .unwrap_or(0.0)
}

/// Parse a fraction string like `"30/1"` into a float.
fn parse_fraction(s: &str) -> f64 {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() == 2 {
        let num = parts[0].parse::<f64>().unwrap_or(0.0);
        let den = parts[1].parse::<f64>().unwrap_or(1.0);
        if den > 0.0 {
            return num / den;
        }
    }
    s.parse::<f64>().unwrap_or(0.0)
}

/// Count total frames from ffprobe output.
pub fn parse_total_frames(probe: &FfprobeOutput) -> i64 {
    if let Some(stream) = first_video_stream(probe) {
        if let Some(nb) = &stream.nb_frames {
            if let Ok(n) = nb.parse::<i64>() {
                return n;
            }
        }
    }
    // Estimate from duration * framerate.
    let duration = parse_duration(probe);
    let fps = parse_framerate(probe);
    if duration > 0.0 && fps > 0.0 {
        return (duration * fps).round() as i64;
    }
    0
}

/// Find the first video stream's resolution.
pub fn parse_resolution(probe: &FfprobeOutput) -> (i32, i32) {
    first_video_stream(probe)
        .map(|s| (s.width.unwrap_or(0), s.height.unwrap_or(0)))
        .unwrap_or((0, 0))
}
