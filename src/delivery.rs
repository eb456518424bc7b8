// Delivery adapter - hands the final file to the messaging client

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::downloader::{PlaybackHints, Platform};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to read video file: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("upload failed: {0}")]
    Transport(String),
}

/// Uploads a local file to the requesting conversation
#[async_trait]
pub trait DeliveryAdapter: Send + Sync {
    async fn deliver(
        &self,
        file: &Path,
        caption: &str,
        hints: &PlaybackHints,
    ) -> Result<(), DeliveryError>;
}

/// Telegram's caption limit, counted in UTF-16 code units
pub const MAX_CAPTION_UNITS: usize = 1024;

/// Caption attached to every delivered video. Long titles are cut so the
/// whole caption stays within `MAX_CAPTION_UNITS`.
pub fn build_caption(platform: Platform, title: &str, bot_username: &str) -> String {
    let head = format!("✅ Downloaded from {}\n🎬 ", platform.display_name());
    let tail = format!("\n🤖 @{}", bot_username);
    let room = MAX_CAPTION_UNITS.saturating_sub(utf16_len(&head) + utf16_len(&tail));
    format!("{}{}{}", head, fit_utf16(title, room), tail)
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

fn fit_utf16(text: &str, room: usize) -> String {
    if utf16_len(text) <= room {
        return text.to_string();
    }
    // One unit is reserved for the ellipsis
    let mut used = 1;
    let mut cut = String::new();
    for c in text.chars() {
        used += c.len_utf16();
        if used > room {
            break;
        }
        cut.push(c);
    }
    cut.push('…');
    cut
}
