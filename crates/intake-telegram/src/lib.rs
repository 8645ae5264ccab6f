//! Telegram adapter (teloxide).
//!
//! This crate implements the `intake-core` MessagingPort over Telegram Bot API
//! and owns the long-polling update loop.

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode};

pub mod handlers;
pub mod router;

use intake_core::{
    domain::{ChatId, MessageId, MessageRef, Recipient},
    errors::Error,
    messaging::port::MessagingPort,
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_recipient(to: &Recipient) -> teloxide::types::Recipient {
        match to {
            Recipient::Chat(id) => teloxide::types::Recipient::Id(teloxide::types::ChatId(id.0)),
            Recipient::Channel(name) => teloxide::types::Recipient::ChannelUsername(name.clone()),
        }
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    fn sent_ref(msg: &Message) -> MessageRef {
        MessageRef {
            chat_id: ChatId(msg.chat.id.0),
            message_id: MessageId(msg.id.0),
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    // Legacy Markdown: the templates use `*bold*` and `**bold**` as written
    // for it, which MarkdownV2 would reject.
    #[allow(deprecated)]
    async fn send_markdown(&self, to: &Recipient, text: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_recipient(to), text.to_string())
            .parse_mode(ParseMode::Markdown)
            .await
            .map_err(Self::map_err)?;
        Ok(Self::sent_ref(&msg))
    }

    async fn send_text(&self, to: &Recipient, text: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_recipient(to), text.to_string())
            .await
            .map_err(Self::map_err)?;
        Ok(Self::sent_ref(&msg))
    }
}
