//! # Blarg Server
//!
//! Application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Redis pool and session store
//! - OAuth and video-calling clients
//! - HTTP server

use anyhow::Result;
use tracing::info;

use blarg::config::Settings;
use blarg::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    blarg::telemetry::init_tracing();

    info!("Starting blarg server...");

    // Load configuration from environment
    let settings = Settings::load()?;
    info!(
        environment = %settings.environment(),
        redis = %settings.redis.address(),
        port = %settings.server.port,
        "Configuration loaded"
    );

    // A session store failure aborts startup here
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
