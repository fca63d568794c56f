use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telegram_relay::config::Config;
use telegram_relay::server::{build_router, AppState};
use telegram_relay::telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,telegram_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Configuration loaded");
    info!("  Bind address: {}", config.bind_addr);
    info!("  Telegram API: {}", config.api_base);
    info!("  Upstream timeout: {:?}", config.upstream_timeout);
    if !config.has_credentials() {
        // The relay still serves; every report is answered with the
        // configuration fault until both secrets are set.
        warn!("TELEGRAM_BOT_TOKEN and/or TELEGRAM_CHAT_ID are not set");
    }

    let bind_addr = config.bind_addr;
    let telegram = TelegramClient::new(&config)?;
    let state = AppState::new(config, telegram);
    let app = build_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;

    info!("Relay is listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
