//! Outbound messaging seam.
//!
//! Handlers talk to [`ChatTransport`] instead of `Bot` directly so the request
//! pipeline can run against a recording fake in tests.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, MessageId, ParseMode, ReplyParameters};

/// Replies bound to one inbound message
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a text reply and return the id of the new message
    async fn reply_text(&self, text: &str, parse_mode: Option<ParseMode>) -> Result<MessageId>;

    /// Replace the text of a previously sent message
    async fn edit_text(&self, message_id: MessageId, text: &str) -> Result<()>;

    /// Delete a previously sent message
    async fn delete_message(&self, message_id: MessageId) -> Result<()>;

    /// Upload a local file as a streamable video reply
    async fn reply_video(&self, path: &Path, caption: &str) -> Result<()>;
}

/// Telegram transport replying to a specific message.
pub struct TelegramTransport {
    bot: Bot,
    chat_id: ChatId,
    reply_to: MessageId,
}

impl TelegramTransport {
    /// Create a transport replying to `reply_to` in `chat_id`.
    pub const fn new(bot: Bot, chat_id: ChatId, reply_to: MessageId) -> Self {
        Self {
            bot,
            chat_id,
            reply_to,
        }
    }

    /// Create a transport replying to `msg`.
    #[must_use]
    pub fn for_message(bot: Bot, msg: &Message) -> Self {
        Self::new(bot, msg.chat.id, msg.id)
    }

    fn reply_parameters(&self) -> ReplyParameters {
        ReplyParameters::new(self.reply_to).allow_sending_without_reply()
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn reply_text(&self, text: &str, parse_mode: Option<ParseMode>) -> Result<MessageId> {
        let mut req = self
            .bot
            .send_message(self.chat_id, text)
            .reply_parameters(self.reply_parameters());
        if let Some(pm) = parse_mode {
            req = req.parse_mode(pm);
        }
        let sent = req.await?;
        Ok(sent.id)
    }

    async fn edit_text(&self, message_id: MessageId, text: &str) -> Result<()> {
        self.bot
            .edit_message_text(self.chat_id, message_id, text)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, message_id: MessageId) -> Result<()> {
        self.bot.delete_message(self.chat_id, message_id).await?;
        Ok(())
    }

    async fn reply_video(&self, path: &Path, caption: &str) -> Result<()> {
        self.bot
            .send_video(self.chat_id, InputFile::file(path))
            .caption(caption)
            .supports_streaming(true)
            .reply_parameters(self.reply_parameters())
            .await?;
        Ok(())
    }
}
