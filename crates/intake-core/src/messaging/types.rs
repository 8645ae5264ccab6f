use crate::domain::{ChatId, UserId};

/// Author of an incoming message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

/// Cross-messenger incoming message.
///
/// Telegram-specific fields stay in the Telegram adapter.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub sender: Option<Sender>,
    pub text: Option<String>,
}

impl IncomingMessage {
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}
