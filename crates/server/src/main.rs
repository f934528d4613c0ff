//! Varylo HTTP server.

use std::sync::Arc;

use channel_dispatch::{ChannelDispatcher, DispatchConfig, HttpMessagingClient};
use database::Database;
use ledger::Ledger;
use orchestrator::{KeyCipher, OpenAiProviders, Pipeline, ProviderResolver};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use varylo_server::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting Varylo server");

    if config.recharge.events_secret.is_none() {
        warn!("RECHARGE_EVENTS_SECRET not set; recharge webhook will reject events");
    }

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let ledger = Ledger::new(db.clone());

    // Outbound messaging
    let dispatch_config = DispatchConfig::from_env();
    let client = Arc::new(HttpMessagingClient::new(dispatch_config.clone())?);
    let dispatcher = ChannelDispatcher::new(db.clone(), client, dispatch_config);

    // Model providers
    let cipher = match config.credentials_key.as_deref() {
        Some(key) => Some(KeyCipher::from_encoded(key)?),
        None => {
            warn!("CREDENTIALS_KEY not set; company-owned provider keys are unusable");
            None
        }
    };
    let providers = ProviderResolver::new(Arc::new(OpenAiProviders::from_env()), cipher);

    let pipeline = Pipeline::standard(db.clone(), ledger.clone(), dispatcher, providers);

    // Build application state
    let state = AppState::new(db, ledger, pipeline, config.recharge.clone());

    // Build router
    let app = router().layer(TraceLayer::new_for_http()).with_state(state);

    // Start server
    info!(addr = %config.addr, "Varylo server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
