mod config;
mod db;
mod http;
mod models;
mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::Cli;
use crate::http::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.debug)?;

    // Load configuration
    let config = config::init(&cli)?;
    tracing::info!("Starting project tracker");

    // Nothing is served until the store is reachable and the table exists
    let db = db::init(&config)
        .await
        .context("failed to initialise the project store")?;
    tracing::info!("Database connection established");

    let state = AppState::new(Arc::new(db));
    http::run_server(state, config.bind_addr()).await?;

    Ok(())
}
