//! # domod — domo daemon
//!
//! Composition root that wires the core and the WebSocket adapter together
//! and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file, env vars)
//! - Assemble the core (connection table, subscription registry,
//!   broadcaster, state manager, dispatcher)
//! - Seed the demo houses when enabled
//! - Build the axum router, bind to a TCP port, and serve
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod seed;

use domo_adapter_ws_axum::router;
use domo_adapter_ws_axum::state::HubState;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = HubState::assemble();
    if config.seed.demo_enabled {
        seed::demo(&state.manager)?;
    }

    let app = router::build(state);
    let bind_addr = config.bind_addr();
    tracing::info!(%bind_addr, "domod listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
