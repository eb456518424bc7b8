// Mobile-compatible re-encode through ffmpeg
//
// One fixed profile: H.264 baseline 3.1 at a bounded bitrate, yuv420p with even
// dimensions, AAC 128k/44.1kHz, and faststart so playback can begin before the
// whole file has arrived.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::utils::run_output_with_timeout;

/// Name of the transcoded deliverable inside the work area
pub const OUTPUT_NAME: &str = "video_mobile.mp4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeOutcome {
    /// New file written; the raw input has been removed
    Transcoded(PathBuf),
    /// No transcoding tool; the raw input is the deliverable
    Skipped,
    /// Tool failed or timed out; the raw input is left untouched
    Failed(String),
}

#[async_trait]
pub trait Transcode: Send + Sync {
    async fn transcode(&self, input: &Path, output_dir: &Path) -> TranscodeOutcome;
}

pub struct FfmpegTranscoder {
    ffmpeg: Option<String>,
    timeout: Duration,
}

impl FfmpegTranscoder {
    /// `ffmpeg` is the probed binary path, or `None` when it is not installed
    pub fn new(ffmpeg: Option<String>, timeout: Duration) -> Self {
        Self { ffmpeg, timeout }
    }

    pub fn is_available(&self) -> bool {
        self.ffmpeg.is_some()
    }

    pub fn build_args(input: &Path, output: &Path) -> Vec<String> {
        [
            "-y",
            "-hide_banner",
            "-loglevel",
            "error",
            "-i",
        ]
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once(input.to_string_lossy().to_string()))
        .chain(
            [
                "-c:v",
                "libx264",
                "-profile:v",
                "baseline",
                "-level",
                "3.1",
                "-pix_fmt",
                "yuv420p",
                "-preset",
                "veryfast",
                "-b:v",
                "2M",
                "-maxrate",
                "2M",
                "-bufsize",
                "4M",
                "-vf",
                "scale=trunc(iw/2)*2:trunc(ih/2)*2",
                "-c:a",
                "aac",
                "-b:a",
                "128k",
                "-ar",
                "44100",
                "-movflags",
                "+faststart",
            ]
            .iter()
            .map(|s| s.to_string()),
        )
        .chain(std::iter::once(output.to_string_lossy().to_string()))
        .collect()
    }
}

#[async_trait]
impl Transcode for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output_dir: &Path) -> TranscodeOutcome {
        let Some(ffmpeg) = &self.ffmpeg else {
            info!("ffmpeg not available, delivering the raw download");
            return TranscodeOutcome::Skipped;
        };

        let output = output_dir.join(OUTPUT_NAME);
        let args = Self::build_args(input, &output);

        let failure = match run_output_with_timeout(ffmpeg, &args, self.timeout).await {
            Ok(out) if out.status.success() && output.is_file() => {
                if let Err(e) = tokio::fs::remove_file(input).await {
                    warn!(path = %input.display(), "could not remove raw download: {}", e);
                }
                info!(path = %output.display(), "transcoded for mobile playback");
                return TranscodeOutcome::Transcoded(output);
            }
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
                format!("ffmpeg exited with {}: {}", out.status, stderr)
            }
            Err(e) => e.to_string(),
        };

        warn!("transcode failed: {}", failure);
        // never hand a half-written file to the caller
        let _ = tokio::fs::remove_file(&output).await;
        TranscodeOutcome::Failed(failure)
    }
}
