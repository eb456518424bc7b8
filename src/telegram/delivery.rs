use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use teloxide::RequestError;

use crate::delivery::{DeliveryAdapter, DeliveryError};
use crate::downloader::PlaybackHints;

lazy_static! {
    // Request URLs embed the token as /bot<id>:<secret>/
    static ref TOKEN_RE: Regex = Regex::new(r"bot\d+:[A-Za-z0-9_-]+").unwrap();
}

/// Remove bot tokens from error text before it is logged or stored
pub fn scrub_token(text: &str) -> String {
    TOKEN_RE.replace_all(text, "bot<redacted>").into_owned()
}

/// Delivers into one chat via `sendVideo`
pub struct ChatDelivery {
    bot: Bot,
    chat_id: ChatId,
}

impl ChatDelivery {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl DeliveryAdapter for ChatDelivery {
    async fn deliver(
        &self,
        file: &Path,
        caption: &str,
        hints: &PlaybackHints,
    ) -> Result<(), DeliveryError> {
        // Surface a vanished file as an I/O error rather than a transport one
        tokio::fs::metadata(file).await?;

        self.bot
            .send_video(self.chat_id, InputFile::file(file))
            .caption(caption)
            .supports_streaming(hints.supports_streaming)
            .width(hints.width)
            .height(hints.height)
            .await
            .map(|_| ())
            .map_err(into_delivery_error)
    }
}

fn into_delivery_error(e: RequestError) -> DeliveryError {
    match e {
        RequestError::Api(api) => DeliveryError::Rejected(api.to_string()),
        other => DeliveryError::Transport(scrub_token(&other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::ApiError;

    #[test]
    fn test_token_is_scrubbed_from_request_errors() {
        let text = "error sending request for url \
                    (https://api.telegram.org/bot123456:AAE-SUPER_secret/sendVideo): connection refused";
        let scrubbed = scrub_token(text);
        assert!(!scrubbed.contains("SUPER_secret"));
        assert!(!scrubbed.contains("123456:"));
        assert!(scrubbed.contains("/bot<redacted>/sendVideo"));
    }

    #[test]
    fn test_plain_text_is_untouched() {
        assert_eq!(scrub_token("about this bot: nothing"), "about this bot: nothing");
    }

    #[test]
    fn test_api_errors_are_rejections() {
        let err = into_delivery_error(RequestError::Api(ApiError::BotBlocked));
        assert!(matches!(err, DeliveryError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let delivery = ChatDelivery::new(Bot::new("123456:AAE-test"), ChatId(42));
        let err = delivery
            .deliver(
                Path::new("/nonexistent/savebot/video_mobile.mp4"),
                "caption",
                &PlaybackHints::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Io(_)));
    }
}
