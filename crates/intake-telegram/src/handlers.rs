//! Telegram update handlers.
//!
//! Messages are translated into the core `IncomingMessage` and handed to the
//! conversation handler, which contains its own failures. The endpoint
//! therefore always succeeds, so one chat can never stall the dispatcher.

use std::sync::Arc;

use teloxide::{prelude::*, types::User};
use tracing::{debug, info};

use intake_core::{
    domain::{ChatId, UserId},
    messaging::types::{IncomingMessage, Sender},
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let incoming = to_incoming(&msg);

    info!("{}", describe(&incoming));

    let outcome = state.conversation.handle(&incoming).await;
    debug!("Chat {} -> {:?}", incoming.chat_id.0, outcome);

    Ok(())
}

/// Log line for an incoming message. Message text stays out of the logs.
fn describe(incoming: &IncomingMessage) -> String {
    let from = incoming
        .sender
        .as_ref()
        .map(|s| s.id.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let len = incoming.text().map(|t| t.chars().count()).unwrap_or(0);
    format!(
        "Message from user {from} in chat {} ({len} chars)",
        incoming.chat_id.0
    )
}

fn to_incoming(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        chat_id: ChatId(msg.chat.id.0),
        sender: msg.from().map(to_sender),
        text: msg.text().map(str::to_string),
    }
}

fn to_sender(user: &User) -> Sender {
    Sender {
        id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}
