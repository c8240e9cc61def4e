//! AgentRepair - HTTP Server Entry Point
//!
//! Starts the web server that hosts the chat UI and relays messages to the
//! configured AI agent service.

use agent_repair::{api, config::Config};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent_repair=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: backend={} model={}",
        config.backend,
        config.model_label()
    );

    // The server starts without credentials so the UI and /api/status stay
    // reachable; chat reports the missing variables instead.
    let missing = config.missing_vars();
    if !missing.is_empty() {
        warn!("Missing environment variables: {}", missing.join(", "));
    }

    // Start HTTP server
    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting server on {}", addr);

    api::serve(config).await?;

    Ok(())
}
