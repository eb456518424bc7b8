// Telegram front end - command dispatch, link handling and video upload

mod bot;
mod delivery;

pub use bot::{help_text, link_in, run, welcome_text, Command};
pub use delivery::{scrub_token, ChatDelivery};
