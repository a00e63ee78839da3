mod config;
mod models;
mod signal;
mod store;
mod telegram;
mod workers;

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::signal::{MarketNoise, SignalSource, SmaSignalSource};
use crate::store::{PriceHistoryStore, SubscriberStore};
use crate::telegram::TelegramClient;
use crate::workers::broadcaster::Deliver;
use crate::workers::{BroadcastWorker, GatewayWorker};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gold_signal_bot=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting gold-signal-bot");

    // Load configuration; a missing bot token is fatal here
    let config = Config::from_env()?;
    info!(
        "Configuration loaded (broadcast every {:?})",
        config.broadcast_interval()
    );

    // Load persisted state
    let prices = Arc::new(PriceHistoryStore::load(&config.prices_file).await);
    let subscribers = Arc::new(SubscriberStore::load(&config.subscribers_file).await);
    info!("Stores initialized");

    // Telegram client and signal strategy
    let client = Arc::new(TelegramClient::new(
        &config.telegram_api_url,
        &config.bot_token,
    ));
    let signal_source: Arc<dyn SignalSource> = Arc::new(SmaSignalSource::new(
        Arc::clone(&prices),
        Box::new(MarketNoise),
    ));
    info!("Telegram client initialized");

    // Create workers
    let broadcaster = BroadcastWorker::new(
        Arc::clone(&signal_source),
        Arc::clone(&subscribers),
        Arc::clone(&client) as Arc<dyn Deliver>,
        config.symbol.clone(),
        config.broadcast_interval(),
    );

    let gateway = GatewayWorker::new(
        Arc::clone(&client),
        Arc::clone(&signal_source),
        Arc::clone(&subscribers),
        config.symbol.clone(),
        config.broadcast_interval_min,
    );

    info!("Workers created, starting...");

    // Spawn workers
    let broadcaster_handle = tokio::spawn(async move {
        broadcaster.run().await;
    });

    let gateway_handle = tokio::spawn(async move {
        gateway.run().await;
    });

    info!("All workers started");

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        result = broadcaster_handle => {
            error!("Broadcaster exited unexpectedly: {:?}", result);
        }
        result = gateway_handle => {
            error!("Gateway exited unexpectedly: {:?}", result);
        }
    }

    info!("Shutting down gold-signal-bot");
    Ok(())
}
