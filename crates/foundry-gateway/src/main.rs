//! foundry-gateway: Teams AI Foundry bot binary
//!
//! Loads configuration, wires the model client, safety gate, session
//! registry and connector together, then serves the Bot Framework
//! endpoint until Ctrl+C.

use std::sync::Arc;

use foundry_core::{Config, FoundryClient, SafetyGate, SessionRegistry, SessionSettings};
use foundry_teams::{AppState, CardInfo, ConnectorClient, TeamsBot};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    // Fail fast: one error names every missing variable
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting Teams AI Foundry bot");
    tracing::info!("Listening on: {}:{}", config.bot.host, config.bot.port);
    if config.bot.app_id.trim().is_empty() {
        tracing::info!("Bot app id: (blank, emulator mode)");
    } else {
        tracing::info!("Bot app id: {}", config.bot.app_id);
    }
    tracing::info!("AI Foundry project: {}", config.foundry.project_name);
    tracing::info!("AI Foundry hub: {}", config.foundry.hub_name);
    tracing::info!("Deployment: {}", config.foundry.openai_deployment);
    tracing::info!(
        "Content safety: {}",
        if config.foundry.enable_content_safety { "enabled" } else { "disabled" }
    );
    tracing::info!(
        "AI search: {}",
        if config.foundry.enable_ai_search { "enabled" } else { "disabled" }
    );

    // Model client
    let model = FoundryClient::new(&config.foundry)
        .map_err(|e| anyhow::anyhow!("Failed to create model client: {}", e))?;

    // Content safety gate (inactive when disabled or not configured)
    let gate = SafetyGate::from_config(&config.foundry);

    // Session registry
    let registry = Arc::new(SessionRegistry::new(
        Arc::new(model),
        SessionSettings::from_config(&config),
    ));

    // Bot Framework connector
    let connector = ConnectorClient::new(
        &config.bot.app_id,
        &config.bot.app_password,
        config.foundry.request_timeout_secs,
    )
    .map_err(|e| anyhow::anyhow!("Failed to create connector client: {}", e))?;

    let card_info = CardInfo::from_config(&config);
    let config = Arc::new(config);
    let bot = Arc::new(TeamsBot::new(registry, gate, Arc::new(connector), card_info));

    let state = AppState {
        bot,
        config: config.clone(),
    };

    let host = config.bot.host.clone();
    let port = config.bot.port;
    let server = tokio::spawn(async move {
        if let Err(e) = foundry_teams::start_server(state, &host, port).await {
            tracing::error!("Server error: {}", e);
        }
    });

    tracing::info!("Press Ctrl+C to exit");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");
    server.abort();
    tracing::info!("Shutdown complete");

    Ok(())
}
