// src/main.rs
//! Imposter Arena Engine
//!
//! Server binary for "LLM Among Us": four LLM agents compete on programming
//! tasks while one of them sabotages the team.

use anyhow::Result;
use imposter_arena::api;
use imposter_arena::game::GameService;
use imposter_arena::oracle::HttpOracle;
use imposter_arena::utils::config::EngineConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting Imposter Arena Engine v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = EngineConfig::load()?;
    info!("Configuration loaded: {:?}", config);

    let oracle = Arc::new(HttpOracle::new(&config.oracle));
    let service = Arc::new(GameService::new(oracle, &config));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown handler
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, api::router(service))
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}
