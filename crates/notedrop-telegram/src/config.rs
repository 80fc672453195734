//! Environment-sourced configuration for the bot and the sync adapter.
//!
//! Everything is read once at startup and carried in explicit config values;
//! nothing in the bot reads the environment after this point.

use std::time::Duration;

use notedrop_sync::{RetryConfig, StoreConfig};

use crate::error::{BotError, Result};

/// Backend URL used with the `--local` flag.
const LOCAL_BACKEND_URL: &str = "http://localhost:8000";

/// Default number of entries shown by `/history`.
const DEFAULT_HISTORY_LIMIT: usize = 5;

/// Bot-side settings.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token.
    pub token: String,
    /// Chats the bot answers to. Everyone else is ignored.
    pub allowed_chat_ids: Vec<i64>,
    /// Chats that get a message when the bot starts.
    pub report_chat_ids: Vec<i64>,
    /// Entries shown by `/history`.
    pub history_limit: usize,
}

impl BotConfig {
    /// Reads the bot configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN").map_err(|_| BotError::NoToken)?;

        let allowed_raw = std::env::var("ALLOWED_CHAT_IDS")
            .map_err(|_| BotError::MissingEnv("ALLOWED_CHAT_IDS"))?;
        let allowed_chat_ids = parse_chat_ids(&allowed_raw, "ALLOWED_CHAT_IDS")?;

        let report_chat_ids = match std::env::var("STARTUP_CHAT_IDS_REPORT") {
            Ok(raw) => parse_chat_ids(&raw, "STARTUP_CHAT_IDS_REPORT")?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            token,
            allowed_chat_ids,
            report_chat_ids,
            history_limit: DEFAULT_HISTORY_LIMIT,
        })
    }

    /// Whether the bot serves this chat.
    pub fn is_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chat_ids.contains(&chat_id)
    }
}

/// Builds the store configuration from the environment.
///
/// With `local` set the base URL points at a localhost backend and the API
/// token may be absent, mirroring a backend run without auth on the side.
pub fn store_config_from_env(local: bool) -> Result<StoreConfig> {
    let base_url = if local {
        LOCAL_BACKEND_URL.to_string()
    } else {
        std::env::var("NOTES_API_URL").map_err(|_| BotError::MissingEnv("NOTES_API_URL"))?
    };

    let api_token = match std::env::var("NOTES_API_TOKEN") {
        Ok(token) => token,
        Err(_) if local => String::new(),
        Err(_) => return Err(BotError::MissingEnv("NOTES_API_TOKEN")),
    };

    let mut config = StoreConfig::new(base_url, api_token);

    if let Some(secs) = parse_env_number::<u64>("NOTES_API_TIMEOUT_SECS")? {
        config.request_timeout = Duration::from_secs(secs);
    }

    let mut retry = RetryConfig::default();
    if let Some(max_retries) = parse_env_number::<u32>("NOTES_MAX_RETRIES")? {
        retry.max_retries = max_retries;
    }
    if let Some(base_ms) = parse_env_number::<u64>("NOTES_RETRY_BASE_MS")? {
        retry.base_delay = Duration::from_millis(base_ms);
    }
    config.retry = retry;

    Ok(config)
}

/// Parses a comma-separated list of chat ids.
///
/// Blank segments are skipped so trailing commas don't break startup.
fn parse_chat_ids(raw: &str, name: &'static str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|_| BotError::InvalidEnv {
                name,
                value: s.to_string(),
            })
        })
        .collect()
}

/// Reads an optional numeric environment variable.
fn parse_env_number<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| BotError::InvalidEnv { name, value: raw }),
        Err(_) => Ok(None),
    }
}
