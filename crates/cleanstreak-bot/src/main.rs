use std::path::PathBuf;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use cleanstreak_core::{store, CheckinTracker, FileStore, SqliteStore, Store};

use cleanstreak_bot::bot::Bot;
use cleanstreak_bot::config::{self, BotConfig, StorageBackend};
use cleanstreak_bot::discord::{socket, DiscordRest};
use cleanstreak_bot::gateway::GuildId;
use cleanstreak_bot::scheduler::DailyTimer;

#[derive(Parser)]
#[command(name = "cleanstreak-bot", version, about = "Daily check-in challenge bot")]
struct Cli {
    /// Path to config.toml (defaults to ~/.config/cleanstreak/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the storage data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the storage backend.
    #[arg(long, value_enum)]
    backend: Option<StorageBackend>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cleanstreak=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(BotConfig::default_path);
    let mut config = BotConfig::load(&config_path)?;
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = Some(data_dir);
    }
    if let Some(backend) = cli.backend {
        config.storage.backend = backend;
    }

    let token = config::token_from_env()?;

    let data_dir = match &config.storage.data_dir {
        Some(dir) => dir.clone(),
        None => store::data_dir()?,
    };
    let store: Box<dyn Store> = match config.storage.backend {
        StorageBackend::File => Box::new(FileStore::open(&data_dir)?),
        StorageBackend::Sqlite => Box::new(SqliteStore::open(&data_dir)?),
    };
    let tracker = CheckinTracker::load(store)?;
    info!(
        members = tracker.members().len(),
        backend = ?config.storage.backend,
        "state loaded"
    );

    let gateway = DiscordRest::new(token.clone(), config.chat.guild_id.map(GuildId));
    let mut bot = Bot::new(gateway, tracker, &config.chat);

    let (events_tx, mut events_rx) = mpsc::channel(64);
    tokio::spawn(socket::run(token, events_tx));

    let prompt_timer = DailyTimer::new(config.schedule.prompt_hour, config.schedule.prompt_minute);
    let reminder_timer = DailyTimer::new(
        config.schedule.reminder_hour,
        config.schedule.reminder_minute,
    );

    info!(channel = config.chat.channel_id, "cleanstreak running");
    loop {
        tokio::select! {
            event = events_rx.recv() => match event {
                Some(event) => bot.handle_event(event).await,
                None => break,
            },
            _ = prompt_timer.wait() => bot.post_daily_prompt().await,
            _ = reminder_timer.wait() => bot.post_evening_reminder().await,
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }
    Ok(())
}
