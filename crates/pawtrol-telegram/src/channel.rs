//! Telegram delivery channel.
//!
//! Tries Markdown first so the renderer's `*bold*` markup shows; falls back
//! to plain text if Telegram rejects the parse mode.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{info, warn};

use pawtrol_core::channel::{DeliveryChannel, SendOutcome};
use pawtrol_core::config::TelegramConfig;

/// Telegram's hard message limit is 4096 characters. Reminder texts are
/// short; this only guards against pathological notes.
const MSG_MAX: usize = 4096;

/// Outbound-only Telegram channel. No dispatcher, no long polling — the
/// engine is the only caller and it pushes.
pub struct TelegramChannel {
    bot: Option<Bot>,
}

impl TelegramChannel {
    /// Build from config. A missing or empty bot token yields a channel
    /// that reports unavailable for the lifetime of the process.
    pub fn new(config: Option<&TelegramConfig>) -> Self {
        let bot = match config {
            Some(c) if !c.bot_token.is_empty() => {
                info!("Telegram channel configured");
                Some(Bot::new(&c.bot_token))
            }
            _ => {
                warn!("no Telegram bot token configured — push notifications disabled");
                None
            }
        };
        Self { bot }
    }
}

/// A recipient must be a numeric chat id (possibly negative for groups).
/// Anything else — typically a bot token pasted where the chat id belongs —
/// is rejected without a remote call.
fn parse_chat_id(recipient: &str) -> Option<i64> {
    recipient.parse().ok()
}

/// Cut `text` at the last char boundary at or below `max` bytes.
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[async_trait]
impl DeliveryChannel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn is_available(&self) -> bool {
        self.bot.is_some()
    }

    async fn send(&self, recipient: &str, text: &str) -> SendOutcome {
        let Some(ref bot) = self.bot else {
            return SendOutcome::Failed("no bot token configured".into());
        };
        let Some(chat_id) = parse_chat_id(recipient) else {
            // Logged distinctly: this usually means a credential ended up
            // in the recipient field.
            warn!(recipient, "telegram: recipient is not a chat id — misconfigured owner record?");
            return SendOutcome::Failed(format!("invalid chat id: {recipient}"));
        };

        let chat = ChatId(chat_id);
        let text = truncate(text, MSG_MAX);

        match bot.send_message(chat, text).parse_mode(ParseMode::Markdown).await {
            Ok(_) => SendOutcome::Delivered,
            Err(_) => {
                // Markdown rejected — retry the same text verbatim.
                match bot.send_message(chat, text).await {
                    Ok(_) => SendOutcome::Delivered,
                    Err(e) => SendOutcome::Failed(e.to_string()),
                }
            }
        }
    }
}
