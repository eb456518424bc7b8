// URL classification - maps a shared link to its source platform

use lazy_static::lazy_static;
use regex::Regex;

use super::models::Platform;

const TIKTOK_PATTERNS: &[&str] = &["tiktok.com"];

// instagr.am and ig.me are the short-link domains Instagram hands out
const INSTAGRAM_PATTERNS: &[&str] = &["instagram.com", "instagr.am", "ig.me"];

lazy_static! {
    static ref URL_RE: Regex = Regex::new(r"(?i)https?://\S+").unwrap();
}

/// Classify a URL by substring patterns. Never fails; unknown input is `Unsupported`.
pub fn classify(url: &str) -> Platform {
    let lower = url.to_lowercase();

    if TIKTOK_PATTERNS.iter().any(|p| lower.contains(p)) {
        Platform::TikTok
    } else if INSTAGRAM_PATTERNS.iter().any(|p| lower.contains(p)) {
        Platform::Instagram
    } else {
        Platform::Unsupported
    }
}

/// Pull the first http(s) link out of a chat message, or the trimmed text if none
pub fn extract_url(text: &str) -> &str {
    URL_RE
        .find(text)
        .map(|m| m.as_str())
        .unwrap_or_else(|| text.trim())
}
