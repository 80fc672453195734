//! Main Telegram bot implementation.

use std::sync::Arc;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use notedrop_sync::{ApiStore, AvailabilityMonitor, StatusChange};

use crate::error::Result;
use crate::handlers::{handle_command, handle_edited_message, handle_message, Command};
use crate::state::BotState;

/// The Telegram bot for Notedrop.
pub struct NoteBot {
    /// The teloxide bot instance.
    bot: Bot,
    /// Shared state across handlers.
    state: Arc<BotState>,
}

impl NoteBot {
    /// Creates a bot from shared state (the token lives in the config).
    pub fn new(state: Arc<BotState>) -> Self {
        let bot = Bot::new(state.config().token.clone());
        Self { bot, state }
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self.bot.get_me().await?;
        Ok(me.username().to_string())
    }

    /// Start the bot in polling mode.
    ///
    /// Spawns the availability monitor and the status-change relay, announces
    /// startup to the configured report chats, then blocks dispatching
    /// updates until shutdown.
    pub async fn start_polling(
        self,
        monitor: AvailabilityMonitor<ApiStore>,
        events: mpsc::Receiver<StatusChange>,
    ) -> Result<()> {
        info!("Starting Notedrop bot in polling mode...");

        self.announce_startup().await;

        tokio::spawn(monitor.run());

        let relay_bot = self.bot.clone();
        let relay_chats = self.state.config().allowed_chat_ids.clone();
        tokio::spawn(async move {
            relay_status_changes(relay_bot, relay_chats, events).await;
        });

        let state_for_commands = Arc::clone(&self.state);
        let state_for_messages = Arc::clone(&self.state);
        let state_for_edits = Arc::clone(&self.state);

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let state = Arc::clone(&state_for_commands);
                        async move { handle_command(bot, msg, cmd, state).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| {
                        // Only plain text; unparsed /commands fall through to
                        // the default handler
                        msg.text().map(|t| !t.starts_with('/')).unwrap_or(false)
                    })
                    .endpoint(move |bot: Bot, msg: Message| {
                        let state = Arc::clone(&state_for_messages);
                        async move { handle_message(bot, msg, state).await }
                    }),
            )
            .branch(Update::filter_edited_message().endpoint(
                move |bot: Bot, msg: Message| {
                    let state = Arc::clone(&state_for_edits);
                    async move { handle_edited_message(bot, msg, state).await }
                },
            ));

        info!("Bot is running! Send /start to begin.");

        Dispatcher::builder(self.bot, handler)
            .default_handler(|upd| async move {
                debug!("Unhandled update: {:?}", upd);
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }

    /// Sends the startup message to the report chats, best effort.
    async fn announce_startup(&self) {
        for chat_id in &self.state.config().report_chat_ids {
            if let Err(e) = self
                .bot
                .send_message(ChatId(*chat_id), "🤖 Notedrop bot is online.")
                .await
            {
                warn!(chat_id, error = %e, "failed to send startup message");
            }
        }
    }
}

/// Forwards backend availability flaps to the allowed chats.
async fn relay_status_changes(
    bot: Bot,
    chat_ids: Vec<i64>,
    mut events: mpsc::Receiver<StatusChange>,
) {
    while let Some(change) = events.recv().await {
        let mut text = if change.now_available {
            "🟢 Backend is available again.".to_string()
        } else {
            "🔴 Backend is unreachable. New notes will be stored offline.".to_string()
        };
        if let Some(report) = change.drained {
            if report.synced > 0 {
                text.push_str(&format!(" Synced {} queued notes.", report.synced));
            }
            if report.failed > 0 {
                text.push_str(&format!(" {} notes are still queued.", report.failed));
            }
        }

        for chat_id in &chat_ids {
            if let Err(e) = bot.send_message(ChatId(*chat_id), text.as_str()).await {
                warn!(chat_id, error = %e, "failed to send status update");
            }
        }
    }
}
