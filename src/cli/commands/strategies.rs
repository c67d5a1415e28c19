//! List strategies command.

use anyhow::Result;
use serde_json::json;
use tokenbt_strategies::StrategyRegistry;

use crate::cli::StrategiesArgs;

pub fn run(args: StrategiesArgs) -> Result<()> {
    let registry = StrategyRegistry::new();

    if args.json {
        let listing: Vec<_> = registry
            .list()
            .into_iter()
            .map(|info| {
                json!({
                    "name": info.name,
                    "description": info.description,
                    "params": info.default_config,
                    "profile": info.profile,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Available Strategies");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for info in registry.list() {
        let profile = &info.profile;
        println!("  {} ", info.name);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        println!(
            "  top {} | warm-up {} days | {:?} | exit costs {:?}",
            profile.top_k, profile.warmup_days, profile.weighting, profile.exit_costs
        );
        println!();
    }

    println!("Use --strategy <name> to select a strategy.");
    println!("Use --json to print default parameters.");

    Ok(())
}
