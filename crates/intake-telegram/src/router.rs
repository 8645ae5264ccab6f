use std::sync::Arc;

use anyhow::Context;
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{debug, info};

use intake_core::{
    config::Config, conversation::ConversationHandler, messaging::port::MessagingPort,
};

use crate::handlers;
use crate::TelegramMessenger;

/// Dependencies injected into every update handler.
#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<ConversationHandler>,
}

impl AppState {
    pub fn new(cfg: Arc<Config>, messenger: Arc<dyn MessagingPort>) -> Self {
        Self {
            conversation: Arc::new(ConversationHandler::new(cfg, messenger)),
        }
    }
}

/// Run the bot until the process is stopped.
///
/// Returns an error only when the bot cannot get going at all (e.g. a
/// rejected token). Per-update failures are handled inside the loop.
pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());
    run_with_bot(bot, cfg).await
}

async fn run_with_bot(bot: Bot, cfg: Arc<Config>) -> anyhow::Result<()> {
    info!("Bot is running...");

    let me = bot
        .get_me()
        .await
        .context("telegram getMe failed (check TELEGRAM_BOT_TOKEN)")?;
    info!("Logged in as @{}", me.username());
    info!("Forwarding applications to {}", cfg.admin_chat);

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState::new(cfg, messenger));

    let handler = Update::filter_message().endpoint(handlers::handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error from the update handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
