use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use super::delivery::{scrub_token, ChatDelivery};
use crate::downloader::{classify, extract_url};
use crate::ledger::current_period;
use crate::pipeline::{Outcome, Pipeline};

const PROCESSING_TEXT: &str = "⏳ Processing your video... This may take a moment.";
const STATS_UNAVAILABLE: &str = "❌ Stats are unavailable right now.";

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "show the welcome message.")]
    Start,
    #[command(description = "explain how to use the bot.")]
    Help,
    #[command(description = "show how many videos were delivered this month.")]
    Stats,
}

/// Link to process from a plain message; `None` for anything that looks like a command
pub fn link_in(text: &str) -> Option<String> {
    let text = text.trim();
    if text.starts_with('/') {
        return None;
    }
    Some(extract_url(text).to_string())
}

pub fn welcome_text(bot_username: &str) -> String {
    format!(
        "👋 Welcome to @{}!\n\n\
         📱 Send me a TikTok or Instagram video link and I'll download it without watermarks.\n\n\
         🔗 Supported platforms:\n\
         • TikTok\n\
         • Instagram (public videos)\n\n\
         💡 Just paste the link and I'll handle the rest!",
        bot_username
    )
}

pub fn help_text(max_file_size: u64) -> String {
    format!(
        "📖 How to use:\n\n\
         1️⃣ Copy a TikTok or Instagram video link\n\
         2️⃣ Send it to me\n\
         3️⃣ I'll download and send the video back\n\n\
         ⚠️ Notes:\n\
         • Videos must be under {}MB\n\
         • Instagram videos must be public\n\
         • Quality: Up to 1080p",
        max_file_size / (1024 * 1024)
    )
}

/// Long-poll and dispatch updates until Ctrl-C
pub async fn run(bot: Bot, pipeline: Arc<Pipeline>) {
    let handler = Update::filter_message()
        .branch(dptree::entry().filter_command::<Command>().endpoint(on_command))
        .branch(dptree::endpoint(on_text));

    info!(bot = %pipeline.options().bot_username, "polling for updates");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![pipeline])
        .default_handler(|_| async {})
        .error_handler(LoggingErrorHandler::with_custom_text("error while handling an update"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    info!("dispatcher stopped");
}

async fn on_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    pipeline: Arc<Pipeline>,
) -> ResponseResult<()> {
    let options = pipeline.options();
    let text = match cmd {
        Command::Start => welcome_text(&options.bot_username),
        Command::Help => help_text(options.max_file_size),
        Command::Stats => stats_text(&pipeline).await,
    };
    reply(&bot, msg.chat.id, &text).await;
    Ok(())
}

async fn on_text(bot: Bot, msg: Message, pipeline: Arc<Pipeline>) -> ResponseResult<()> {
    let Some(url) = msg.text().and_then(link_in) else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without a link");
        return Ok(());
    };

    // Each link runs on its own task so other chats keep being served
    tokio::spawn(handle_link(bot, pipeline, msg.chat.id, url));
    Ok(())
}

async fn stats_text(pipeline: &Pipeline) -> String {
    let period = match current_period() {
        Ok(period) => period,
        Err(e) => {
            error!("could not compute usage period: {}", e);
            return STATS_UNAVAILABLE.to_string();
        }
    };
    match pipeline.ledger().read(&period).await {
        Ok(count) => format!("📊 Videos delivered this month ({}): {}", period, count),
        Err(e) => {
            error!("failed to read usage ledger: {}", e);
            STATS_UNAVAILABLE.to_string()
        }
    }
}

async fn reply(bot: &Bot, chat_id: ChatId, text: &str) {
    if let Err(e) = bot.send_message(chat_id, text).await {
        warn!(chat_id = chat_id.0, "failed to send reply: {}", scrub_token(&e.to_string()));
    }
}

async fn handle_link(bot: Bot, pipeline: Arc<Pipeline>, chat_id: ChatId, url: String) {
    if !classify(&url).is_supported() {
        if let Some(text) = Outcome::Unsupported.user_message() {
            reply(&bot, chat_id, &text).await;
        }
        return;
    }

    let status: Option<MessageId> = match bot.send_message(chat_id, PROCESSING_TEXT).await {
        Ok(message) => Some(message.id),
        Err(e) => {
            warn!(chat_id = chat_id.0, "failed to send processing notice: {}", scrub_token(&e.to_string()));
            None
        }
    };

    let delivery = ChatDelivery::new(bot.clone(), chat_id);
    let outcome = pipeline.process(&url, &delivery).await;

    match (outcome.user_message(), status) {
        (None, Some(message_id)) => {
            if let Err(e) = bot.delete_message(chat_id, message_id).await {
                debug!(chat_id = chat_id.0, "could not delete processing notice: {}", scrub_token(&e.to_string()));
            }
        }
        (None, None) => {}
        (Some(text), Some(message_id)) => {
            if let Err(e) = bot.edit_message_text(chat_id, message_id, text).await {
                warn!(chat_id = chat_id.0, "failed to edit processing notice: {}", scrub_token(&e.to_string()));
            }
        }
        (Some(text), None) => reply(&bot, chat_id, &text).await,
    }
}
