//! Error types for the Telegram bot.

use thiserror::Error;

use notedrop_sync::SyncError;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Bot token not provided.
    #[error("Telegram bot token not set. Set TELEGRAM_BOT_TOKEN environment variable.")]
    NoToken,

    /// A required environment variable is missing.
    #[error("Missing required environment variable: {0}")]
    MissingEnv(&'static str),

    /// An environment variable could not be parsed.
    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    /// The sync adapter failed.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// A Telegram API call failed.
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;
