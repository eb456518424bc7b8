// Extraction strategy table
//
// Each platform gets a fixed, ordered list of attempts. An attempt differs from
// the others only by data (identity, format selector, cookies, headers); the
// acquisition engine runs them all through the same code path.

use super::models::Platform;

/// One fully-specified extraction attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionStrategy {
    pub platform: Platform,
    /// Short name used in logs
    pub label: &'static str,
    /// Network identity; `None` keeps the backend default
    pub user_agent: Option<&'static str>,
    /// yt-dlp format selector
    pub format: &'static str,
    /// Browser to borrow cookies from
    pub cookies_from_browser: Option<&'static str>,
    pub headers: &'static [(&'static str, &'static str)],
}

/// Output file name stem the backend writes to, inside a per-attempt directory
pub const OUTPUT_STEM: &str = "raw_video";

/// Container the backend merges separate streams into
pub const MERGE_OUTPUT_FORMAT: &str = "mp4";

/// Format selector used when a strategy does not override it
pub const BASE_FORMAT: &str =
    "best[ext=mp4][vcodec^=avc1]/best[ext=mp4]/bestvideo[ext=mp4]+bestaudio[ext=m4a]/best";

const H264_1080_FORMAT: &str =
    "best[ext=mp4][vcodec^=avc1][height<=1080]/best[ext=mp4][height<=1080]/best[ext=mp4]/best";

const DESKTOP_CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const TIKTOK_APP_UA: &str = "TikTok 26.1.3 rv:261303 (iPhone; iOS 14.4.2; en_US) Cronet";
const INSTAGRAM_APP_UA: &str = "Instagram 276.0.0.15.103 Android (30/11; 420dpi; 1080x2220; samsung; SM-G973F; beyond1; exynos9820)";
const IPHONE_SAFARI_UA: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15";

const NAVIGATE_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Sec-Fetch-Mode", "navigate"),
];

static TIKTOK: [ExtractionStrategy; 3] = [
    ExtractionStrategy {
        platform: Platform::TikTok,
        label: "desktop-chrome",
        user_agent: Some(DESKTOP_CHROME_UA),
        format: H264_1080_FORMAT,
        cookies_from_browser: None,
        headers: &[],
    },
    ExtractionStrategy {
        platform: Platform::TikTok,
        label: "tiktok-app",
        user_agent: Some(TIKTOK_APP_UA),
        format: "best[ext=mp4]/best",
        cookies_from_browser: None,
        headers: &[],
    },
    ExtractionStrategy {
        platform: Platform::TikTok,
        label: "browser-cookies",
        user_agent: None,
        format: BASE_FORMAT,
        cookies_from_browser: Some("chrome"),
        headers: &[],
    },
];

static INSTAGRAM: [ExtractionStrategy; 3] = [
    ExtractionStrategy {
        platform: Platform::Instagram,
        label: "instagram-app",
        user_agent: Some(INSTAGRAM_APP_UA),
        format: H264_1080_FORMAT,
        cookies_from_browser: None,
        headers: NAVIGATE_HEADERS,
    },
    ExtractionStrategy {
        platform: Platform::Instagram,
        label: "browser-cookies",
        user_agent: Some(DESKTOP_CHROME_UA),
        format: BASE_FORMAT,
        cookies_from_browser: Some("chrome"),
        headers: &[],
    },
    ExtractionStrategy {
        platform: Platform::Instagram,
        label: "mobile-safari-720p",
        user_agent: Some(IPHONE_SAFARI_UA),
        format: "best[height<=720]/best",
        cookies_from_browser: None,
        headers: &[],
    },
];

/// Strategies for a platform in priority order
pub fn strategies_for(platform: Platform) -> &'static [ExtractionStrategy] {
    match platform {
        Platform::TikTok => &TIKTOK,
        Platform::Instagram => &INSTAGRAM,
        Platform::Unsupported => &[],
    }
}
