//! CLI definitions.

pub mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tokenbt_config::{load_config, load_default_config, AppConfig};

/// Configuration file used when `--config` is not given and it exists.
const DEFAULT_CONFIG: &str = "config/default.toml";

#[derive(Parser)]
#[command(name = "tokenbt")]
#[command(author, version, about = "Backtester for systematic crypto token rotation strategies")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TOKENBT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a backtest over a CSV price panel
    Backtest(BacktestArgs),
    /// List available strategies
    Strategies(StrategiesArgs),
    /// Validate configuration and print the effective settings
    ValidateConfig,
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    /// Strategy to backtest
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Price data: a CSV file or a directory of CSV files
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Initial capital
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Days between rebalances
    #[arg(long)]
    pub rebalance_days: Option<usize>,

    /// Number of positions held after a rebalance
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Strategy parameter overrides as JSON, e.g. '{"rsi_entry": 45}'
    #[arg(long)]
    pub params: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Save the full report as JSON
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Save the portfolio value series as CSV
    #[arg(long)]
    pub save_series: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct StrategiesArgs {
    /// Print default parameters and policy as JSON
    #[arg(long)]
    pub json: bool,
}

/// Load the application configuration.
///
/// An explicit path must exist. Without one, `config/default.toml` is used
/// when present, otherwise defaults plus `TOKENBT__*` environment variables.
pub fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG).exists() => load_config(Path::new(DEFAULT_CONFIG))
            .with_context(|| format!("Failed to load configuration from {}", DEFAULT_CONFIG)),
        None => load_default_config().context("Failed to load configuration"),
    }
}
