//! Command and message handlers for the Telegram bot.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ReactionType;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info};

use notedrop_models::Record;
use notedrop_sync::Availability;

use crate::dispatch::{route_text, TextAction};
use crate::state::{BotState, SaveDisposition};

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Welcome message and help")]
    Start,

    #[command(description = "Show recent notes, queued ones marked")]
    History,

    #[command(description = "Show backend status and queue counts")]
    Memory,

    #[command(description = "Push queued notes to the backend now")]
    Sync,

    #[command(description = "Discard queued notes")]
    Flush,
}

/// Handle a / command.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    if !state.is_allowed(msg.chat.id.0) {
        debug!(chat_id = %msg.chat.id, "ignoring command from unknown chat");
        return Ok(());
    }

    match cmd {
        Command::Start => handle_start(bot, msg).await,
        Command::History => handle_history(bot, msg, state).await,
        Command::Memory => handle_memory(bot, msg, state).await,
        Command::Sync => handle_sync(bot, msg, state).await,
        Command::Flush => handle_flush(bot, msg, state).await,
    }
}

/// Handle the /start command.
async fn handle_start(bot: Bot, msg: Message) -> ResponseResult<()> {
    let welcome = "Welcome to Notedrop! 📝\n\n\
        Send me any message and I'll store it as a note. Edit a message and \
        I'll update the stored note instead of creating a duplicate. If the \
        backend is down, notes are kept here and synced once it returns.\n\n\
        Commands:\n\
        /history - recent notes\n\
        /memory - backend status and queue counts\n\
        /sync - push queued notes now\n\
        /flush - discard queued notes";

    bot.send_message(msg.chat.id, welcome).await?;
    info!(chat_id = %msg.chat.id, "user started bot");
    Ok(())
}

/// Handle the /history command.
async fn handle_history(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let limit = state.config().history_limit;
    let (entries, pending) = state.history(limit).await;

    if entries.is_empty() {
        bot.send_message(msg.chat.id, "No notes yet.").await?;
        return Ok(());
    }

    let mut message = String::from("Recent notes:\n\n");
    for entry in &entries {
        let marker = if entry.pending { "🔄 " } else { "" };
        message.push_str(&format!(
            "{}📅 {}\n{}\n\n",
            marker,
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.text
        ));
    }
    if pending > 0 {
        message.push_str(&format!("🔄 {pending} notes waiting to sync"));
    }

    bot.send_message(msg.chat.id, message).await?;
    Ok(())
}

/// Handle the /memory command.
async fn handle_memory(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let status = state.memory_status().await;

    let backend = match status.availability {
        Availability::Available => "🟢 online",
        Availability::Unavailable => "🔴 offline",
        Availability::Unknown => "⚪ not checked yet",
    };
    let last_checked = status
        .last_checked
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    let message = format!(
        "🧠 Status:\n\n\
        Backend: {backend}\n\
        Last checked: {last_checked}\n\
        Queued notes: {}\n\
        Cached notes: {}",
        status.pending, status.cached
    );

    bot.send_message(msg.chat.id, message).await?;
    Ok(())
}

/// Handle the /sync command.
async fn handle_sync(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let pending = state.pending_count().await;
    if pending == 0 {
        bot.send_message(msg.chat.id, "No queued notes to sync.")
            .await?;
        return Ok(());
    }

    if !state.is_available().await {
        bot.send_message(
            msg.chat.id,
            format!(
                "⚠️ Backend is currently offline.\n\
                {pending} notes are queued and will sync automatically when it returns."
            ),
        )
        .await?;
        return Ok(());
    }

    let report = state.sync_now().await;
    let message = if report.is_clean() {
        format!("✅ Synced {} notes!", report.synced)
    } else {
        format!(
            "📊 Sync results:\n\
            ✅ {} synced\n\
            ❌ {} failed and stay queued",
            report.synced, report.failed
        )
    };

    bot.send_message(msg.chat.id, message).await?;
    Ok(())
}

/// Handle the /flush command.
async fn handle_flush(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let dropped = state.flush().await;
    let message = if dropped == 0 {
        "No queued notes to discard.".to_string()
    } else {
        format!("✅ Discarded {dropped} queued notes.")
    };

    bot.send_message(msg.chat.id, message).await?;
    Ok(())
}

/// Handle a plain text message: route it, usually saving it as a note.
pub async fn handle_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    if !state.is_allowed(msg.chat.id.0) {
        debug!(chat_id = %msg.chat.id, "ignoring message from unknown chat");
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    match route_text(text) {
        TextAction::Pong => {
            bot.send_message(msg.chat.id, "pong").await?;
        }
        TextAction::SaveNote => {
            let record = Record::new(Some(msg.chat.id.0), msg.id.0.to_string(), text);
            save_and_acknowledge(&bot, &msg, record, state).await;
        }
    }

    Ok(())
}

/// Handle an edit to an earlier message: re-save under the same identifier.
///
/// The wire identifier is derived from chat and message ids, so the remote
/// updates the stored note instead of creating a new one.
pub async fn handle_edited_message(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    if !state.is_allowed(msg.chat.id.0) {
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    debug!(chat_id = %msg.chat.id, message_id = msg.id.0, "message edited, re-saving note");
    let record = Record::new(Some(msg.chat.id.0), msg.id.0.to_string(), text);
    save_and_acknowledge(&bot, &msg, record, state).await;
    Ok(())
}

/// Submits a record and acknowledges the outcome in the chat.
///
/// Adapter errors never surface to the user: a rejected note is only logged,
/// and a queued note gets a short explanatory reply.
async fn save_and_acknowledge(bot: &Bot, msg: &Message, record: Record, state: Arc<BotState>) {
    match state.submit(record).await {
        SaveDisposition::Saved(result) => {
            info!(
                chat_id = %msg.chat.id,
                message_id = %result.message_id,
                outcome = ?result.outcome,
                "note saved"
            );
            react_saved(bot, msg).await;
        }
        SaveDisposition::Buffered => {
            let _ = bot
                .send_message(
                    msg.chat.id,
                    "🔄 Stored offline. I'll sync it when the backend returns.",
                )
                .await;
        }
        SaveDisposition::Rejected => {
            // Already logged with context by BotState; the chat stays quiet.
        }
    }
}

/// Marks the message with a writing-hand reaction.
async fn react_saved(bot: &Bot, msg: &Message) {
    let reaction = vec![ReactionType::Emoji {
        emoji: "✍".to_string(),
    }];
    if let Err(e) = bot
        .set_message_reaction(msg.chat.id, msg.id)
        .reaction(reaction)
        .await
    {
        debug!(chat_id = %msg.chat.id, error = %e, "could not set reaction");
    }
}
