use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zapmeow_bridge::config::Config;
use zapmeow_bridge::dispatch::LoggingDispatcher;
use zapmeow_bridge::platform::zapmeow::ZapMeowChannel;
use zapmeow_bridge::platform::{Channel, RegistryAccessor};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,zapmeow_bridge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Assistant: {}", config.assistant.name);
    info!("  Own number: {}", config.assistant.has_own_number);
    info!(
        "  Gateway: {} (instance {})",
        config.zapmeow.base_url, config.zapmeow.instance_id
    );
    info!("  Registered chats: {}", config.registered_chats.len());

    let config = Arc::new(config);
    let groups = config.registered_groups();
    let registry: RegistryAccessor = Arc::new(move || groups.clone());

    let channel = ZapMeowChannel::new(Arc::clone(&config), Arc::new(LoggingDispatcher), registry);

    info!("Bridge is starting...");
    channel
        .connect()
        .await
        .context("Failed to start ZapMeow channel")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down...");
    channel.disconnect().await;

    Ok(())
}
