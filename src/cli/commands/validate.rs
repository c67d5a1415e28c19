//! Validate configuration command.

use anyhow::{Context, Result};
use tokenbt_config::AppConfig;
use tokenbt_strategies::StrategyRegistry;

pub fn run(config: &AppConfig) -> Result<()> {
    // Overrides must still produce a valid strategy and policy
    let registry = StrategyRegistry::new();
    let name = &config.backtest.strategy;
    if let Some(params) = &config.backtest.params {
        registry
            .create_with_overrides(name, params)
            .context("Invalid strategy parameters")?;
    }
    if let Some(profile) = &config.backtest.profile {
        registry
            .profile_with_overrides(name, profile)
            .context("Invalid strategy policy")?
            .validate()
            .context("Invalid strategy policy")?;
    }

    println!("Configuration is valid!");
    println!();
    println!("{}", config.to_toml().context("Failed to render configuration")?);

    Ok(())
}
