//! Backtest command implementation.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::path::PathBuf;
use tokenbt_backtest::{BacktestConfig, BacktestEngine};
use tokenbt_config::AppConfig;
use tokenbt_strategies::{merge_json, StrategyRegistry};
use tracing::info;

use crate::cli::{BacktestArgs, OutputFormat};

pub async fn run(args: BacktestArgs, config: AppConfig) -> Result<()> {
    let settings = config.backtest;
    let strategy_name = args.strategy.unwrap_or(settings.strategy);
    info!(strategy = %strategy_name, "Starting backtest");

    // Parameter overrides: configuration file first, then the command line
    let mut params = settings.params.unwrap_or_else(|| json!({}));
    if let Some(raw) = &args.params {
        let cli_params: Value =
            serde_json::from_str(raw).context("--params must be a JSON object")?;
        merge_json(&mut params, &cli_params);
    }

    let mut profile_overrides = settings.profile.unwrap_or_else(|| json!({}));
    if let Some(top_k) = args.top_k {
        merge_json(&mut profile_overrides, &json!({ "top_k": top_k }));
    }

    // Create strategy
    let registry = StrategyRegistry::new();
    let strategy = registry
        .create_with_overrides(&strategy_name, &params)
        .context("Failed to create strategy")?;
    let profile = registry
        .profile_with_overrides(&strategy_name, &profile_overrides)
        .context("Invalid strategy policy")?;

    // Load data
    let data_path: PathBuf = match args.data.or(settings.data_path.map(PathBuf::from)) {
        Some(path) => path,
        None => anyhow::bail!(
            "Please provide a data file or directory with --data (e.g. --data ./data/prices.csv)"
        ),
    };
    if !data_path.exists() {
        anyhow::bail!(
            "Data path '{}' does not exist. Provide a CSV file or a directory of CSV files",
            data_path.display()
        );
    }
    let panel = tokenbt_data::load_csv(&data_path)
        .await
        .with_context(|| format!("Failed to load price data from {}", data_path.display()))?;

    // Create backtest config
    let backtest_config = BacktestConfig {
        initial_capital: args.capital.unwrap_or(settings.initial_capital),
        rebalance_days: args.rebalance_days.unwrap_or(settings.rebalance_days),
        profile,
    };

    // Run backtest
    let engine = BacktestEngine::new(backtest_config);
    let report = engine
        .run_panel(strategy.as_ref(), &panel)
        .context("Backtest failed")?;

    // Output results
    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    // Save if requested
    let output_dir = settings.output_dir.map(PathBuf::from);
    if let Some(save_path) = resolve(args.save, output_dir.as_ref(), "report.json") {
        std::fs::write(&save_path, report.to_json()?)
            .with_context(|| format!("Failed to write {}", save_path.display()))?;
        info!("Report saved to {:?}", save_path);
    }
    if let Some(series_path) = resolve(args.save_series, output_dir.as_ref(), "series.csv") {
        std::fs::write(&series_path, report.series_to_csv()?)
            .with_context(|| format!("Failed to write {}", series_path.display()))?;
        info!("Value series saved to {:?}", series_path);
    }

    Ok(())
}

/// Explicit path wins; otherwise a default file name inside the output directory.
fn resolve(explicit: Option<PathBuf>, output_dir: Option<&PathBuf>, file: &str) -> Option<PathBuf> {
    explicit.or_else(|| output_dir.map(|dir| dir.join(file)))
}
