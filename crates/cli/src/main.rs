//! mistok — a user/admin relay bot for Telegram.

use std::{path::PathBuf, sync::Arc};

use {
    clap::Parser,
    tokio_util::sync::CancellationToken,
    tracing::{error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    mistok_relay::MenuFlow,
    mistok_storage::{
        ConsultationStore, ProfileStore, SqliteConsultationStore, SqliteProfileStore,
    },
    mistok_telegram::{
        Dispatcher, TelegramTransport, Transport, access::AdminRoster, bot, menus,
    },
};

#[derive(Parser)]
#[command(name = "mistok", about = "Mistok — user/admin relay bot for Telegram")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Config file path (overrides discovery).
    #[arg(long, env = "MISTOK_CONFIG")]
    config: Option<PathBuf>,

    /// Keep-alive server bind address (overrides config value).
    #[arg(long)]
    bind: Option<String>,

    /// Keep-alive server port (overrides config value).
    #[arg(long)]
    port: Option<u16>,

    /// SQLite database path (overrides config value).
    #[arg(long, env = "MISTOK_DB")]
    db: Option<PathBuf>,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let mut config = match &cli.config {
        Some(path) => mistok_config::load_config(path)?,
        None => mistok_config::discover_and_load()?,
    };
    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(db) = &cli.db {
        config.storage.db_path = db.clone();
    }
    config.validate()?;

    let pool = mistok_storage::connect(&config.storage.db_path).await?;
    mistok_storage::run_migrations(&pool).await?;
    let profiles: Arc<dyn ProfileStore> = Arc::new(SqliteProfileStore::new(pool.clone()));
    let consultations: Arc<dyn ConsultationStore> = Arc::new(SqliteConsultationStore::new(pool));

    let telegram_bot = bot::build_bot(&config.telegram)?;
    let transport: Arc<dyn Transport> = Arc::new(TelegramTransport::new(telegram_bot.clone()));
    let dispatcher = Arc::new(Dispatcher::new(
        AdminRoster::new(config.telegram.admin_ids()),
        MenuFlow::new(menus::command_table()),
        profiles,
        consultations,
        transport,
    ));

    let cancel = CancellationToken::new();

    // Keep-alive responder for the hosting platform's health checks.
    let gateway = tokio::spawn({
        let cancel = cancel.clone();
        let bind = config.server.bind.clone();
        let port = config.server.port;
        async move {
            if let Err(e) = mistok_gateway::serve(&bind, port, cancel).await {
                error!("keep-alive server failed: {e}");
            }
        }
    });

    bot::start_polling(telegram_bot, dispatcher, cancel.clone()).await?;
    info!("bot started");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
        () = cancel.cancelled() => {
            info!("polling cancelled, shutting down");
        }
    }
    cancel.cancel();
    let _ = gateway.await;
    Ok(())
}
