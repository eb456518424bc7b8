// Common data models for the download pipeline

use serde::Deserialize;
use std::fmt;

/// Source platform of a shared link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    TikTok,
    Instagram,
    Unsupported,
}

impl Platform {
    /// Human-readable name used in captions and replies
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::TikTok => "TikTok",
            Self::Instagram => "Instagram",
            Self::Unsupported => "Unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Metadata reported by the extraction backend after a download
///
/// Deserialized straight from yt-dlp's `--dump-json` line; unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<f64>,
}

impl MediaMetadata {
    /// Title for display, "Video" when the backend gave none
    pub fn display_title(&self) -> String {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Video")
            .to_string()
    }
}

/// Hints passed to the messaging client together with the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackHints {
    pub supports_streaming: bool,
    pub width: u32,
    pub height: u32,
}

impl PlaybackHints {
    pub const DEFAULT_WIDTH: u32 = 1280;
    pub const DEFAULT_HEIGHT: u32 = 720;

    pub fn from_metadata(meta: &MediaMetadata) -> Self {
        match (meta.width, meta.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Self {
                supports_streaming: true,
                width: w,
                height: h,
            },
            _ => Self::default(),
        }
    }
}

impl Default for PlaybackHints {
    fn default() -> Self {
        Self {
            supports_streaming: true,
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
        }
    }
}

/// Network settings shared by every strategy
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Socket timeout in seconds
    pub socket_timeout: u32,

    /// Retries the backend performs on its own
    pub retries: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            socket_timeout: 30,
            retries: 3,
        }
    }
}
