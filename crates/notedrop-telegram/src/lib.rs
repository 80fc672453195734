//! Telegram bot interface for Notedrop.
//!
//! This crate wires the resilient save adapter from `notedrop-sync` to a
//! Telegram chat. Plain text messages become notes in the remote store,
//! edits update the stored note in place, and when the backend is down the
//! notes queue locally until it recovers.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `NOTES_API_URL`: Base URL of the notes API (unless running with `--local`)
//! - `NOTES_API_TOKEN`: Bearer token for the notes API
//! - `ALLOWED_CHAT_IDS`: Comma-separated chat ids the bot answers to
//!
//! Optional:
//! - `STARTUP_CHAT_IDS_REPORT`: Chats that get a message when the bot starts
//! - `NOTES_API_TIMEOUT_SECS`: Per-attempt request timeout (default: 30)
//! - `NOTES_MAX_RETRIES`: Save attempts before giving up (default: 3)
//! - `NOTES_RETRY_BASE_MS`: Base backoff delay in milliseconds (default: 1000)
//!
//! # Commands
//!
//! - `/start` - Welcome message
//! - `/history` - Recent notes, queued ones marked
//! - `/memory` - Backend status and queue counts
//! - `/sync` - Push queued notes to the backend now
//! - `/flush` - Discard queued notes

pub mod bot;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod state;

pub use bot::NoteBot;
pub use config::{store_config_from_env, BotConfig};
pub use error::{BotError, Result};
pub use state::{BotState, SaveDisposition};
