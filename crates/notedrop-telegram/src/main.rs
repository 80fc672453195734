//! Notedrop Telegram bot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx cargo run -p notedrop-telegram
//! ```

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use notedrop_sync::{
    ApiStore, AvailabilityMonitor, AvailabilityState, MonitorConfig, NoteStore, OfflineBuffer,
};
use notedrop_telegram::{store_config_from_env, BotConfig, BotState, NoteBot};

/// Notedrop - save Telegram messages to a remote notes store
#[derive(Parser, Debug)]
#[command(name = "notedrop-telegram")]
#[command(about = "Telegram bot that persists your messages as notes")]
struct Args {
    /// Use a localhost backend instead of NOTES_API_URL
    #[arg(short, long)]
    local: bool,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let filter = match args.verbose {
        0 => "notedrop_telegram=info,notedrop_sync=info,teloxide=warn",
        1 => "notedrop_telegram=debug,notedrop_sync=debug,teloxide=info",
        2 => "notedrop_telegram=trace,notedrop_sync=trace,teloxide=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let bot_config = BotConfig::from_env()?;
    let store_config = store_config_from_env(args.local)?;
    tracing::info!(base_url = %store_config.base_url, local = args.local, "using notes backend");

    let store = Arc::new(ApiStore::new(store_config)?);
    let buffer = Arc::new(OfflineBuffer::new());
    let availability = Arc::new(AvailabilityState::new());

    let (monitor, events) = AvailabilityMonitor::new(
        Arc::clone(&store),
        Arc::clone(&buffer),
        Arc::clone(&availability),
        MonitorConfig::default(),
    );

    let state = Arc::new(BotState::new(
        store as Arc<dyn NoteStore>,
        buffer,
        availability,
        bot_config,
    ));

    let bot = NoteBot::new(Arc::clone(&state));
    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n📝 Notedrop Telegram Bot");
            println!("   Bot: @{}", username);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("\n📱 Open Telegram and send /start to begin");
    println!("   Press Ctrl+C to stop\n");

    bot.start_polling(monitor, events).await?;

    Ok(())
}
