//! # Babbly CLI
//!
//! Command-line front end for the Babbly API Gateway.

use clap::Parser;

mod cli;
mod commands;
mod config;
mod state;
mod telemetry;

use cli::Cli;
use config::AppConfig;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env(&cli);
    tracing::debug!(api_url = %config.client.api_url, "Configuration loaded");

    let state = AppState::new(&config).await?;

    let result = commands::run(&state.ctx, cli.command).await;
    state.ctx.shutdown();

    if let Err(e) = &result {
        tracing::debug!(error = %e, "Command failed");
    }
    result
}
