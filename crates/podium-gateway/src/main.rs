//! Gateway binary for the Podium voting service.
//!
//! Wires the store pool, credit ledger, ranking engine, vote
//! transaction, and notification hub into the HTTP server.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `podium.yaml` (or `PODIUM_CONFIG`)
//! 3. Connect the store pool and run migrations
//! 4. Assemble the shared application state
//! 5. Serve until terminated

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use podium_gateway::config::{ConfigError, GatewayConfig};
use podium_gateway::server::start_server;
use podium_gateway::state::AppState;
use podium_store::{StoreConfig, StorePool};

/// Environment variable overriding the config file location.
const CONFIG_ENV: &str = "PODIUM_CONFIG";
/// Default config file path, relative to the working directory.
const CONFIG_PATH: &str = "podium.yaml";

/// Application entry point for the gateway.
///
/// # Errors
///
/// Returns an error if configuration loading, the database connection,
/// or the server itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("podium-gateway starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        host = config.server.host,
        port = config.server.port,
        credit_interval_secs = config.credits.interval_secs,
        credit_cap = config.credits.cap,
        min_votes = config.ranking.min_votes,
        "configuration loaded"
    );

    // 3. Connect the store pool and run migrations.
    let store_config = StoreConfig::new(&config.database.url)
        .with_max_connections(config.database.max_connections);
    let pool = StorePool::connect(&store_config).await?;
    pool.run_migrations().await?;
    info!("store connected, migrations applied");

    // 4. Assemble shared state.
    let state = Arc::new(AppState::new(pool, config.initial_settings()));

    // 5. Serve.
    let result = start_server(&config.server, Arc::clone(&state)).await;

    // Stop in-flight store retries before the pool goes away.
    state.cancel.cancel();
    state.pool.close().await;

    result?;
    info!("podium-gateway stopped");
    Ok(())
}

/// Load configuration from `PODIUM_CONFIG` or the default path.
///
/// A missing file is not an error: the gateway starts with built-in
/// defaults so a fresh checkout runs without ceremony. A file that
/// exists but fails to parse is fatal; a broken config must never
/// silently fall back to defaults.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file exists but cannot be parsed.
fn load_config() -> Result<GatewayConfig, ConfigError> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| String::from(CONFIG_PATH));
    let path = Path::new(&path);

    if !path.exists() {
        warn!(path = %path.display(), "config file not found, using defaults");
        return Ok(GatewayConfig::default());
    }

    GatewayConfig::load(path)
}
