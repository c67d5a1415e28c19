//! Token rotation backtester CLI.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use tokenbt_monitor::{setup_logging, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli::load_app_config(cli.config.as_deref())?;

    // Setup logging
    let log_level = match cli.log_level {
        Some(level) => level.as_str().to_string(),
        None => config.logging.level.clone(),
    };
    let format = if cli.json_logs || config.logging.is_json() {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    setup_logging(&log_level, format).context("Failed to initialise logging")?;

    // Execute command
    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, config).await,
        Commands::Strategies(args) => cli::commands::strategies::run(args),
        Commands::ValidateConfig => cli::commands::validate::run(&config),
    }
}
