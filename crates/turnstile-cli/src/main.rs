//! Turnstile command line entry point.
//!
//! Loads configuration, sets up logging and runs one lock command against
//! the configured memcached server.

mod cli;
mod commands;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use turnstile_core::Configuration;
use turnstile_core::config::MEMCACHED_ADDRESS;
use turnstile_store::MemcachedStore;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let overrides = cli
        .address
        .clone()
        .map(|address| (MEMCACHED_ADDRESS.to_string(), address));
    let configuration = Configuration::load(cli.config.as_deref(), overrides)?;

    logging::init_logging(&configuration.log_level())?;
    turnstile_core::metrics::init_metrics();

    let store = MemcachedStore::new(
        configuration.memcached_address(),
        configuration.memcached_pool_size(),
        configuration.memcached_connect_timeout(),
    );

    commands::execute(
        &cli.command,
        Arc::new(store),
        configuration.lock_options(),
        &mut std::io::stdout(),
    )
    .await
}
