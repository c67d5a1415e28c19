//! Strategy registry: the closed set of strategy variants.

use crate::{
    ReversionMomentumConfig, ReversionMomentumStrategy, SmaTrendConfig, SmaTrendStrategy,
    StrategyProfile,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tokenbt_core::{error::StrategyError, traits::Strategy, traits::StrategyConfig};

/// Built-in strategy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    ReversionMomentum,
    ReversionMomentumRelaxed,
    SmaTrend,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::ReversionMomentum,
        StrategyKind::ReversionMomentumRelaxed,
        StrategyKind::SmaTrend,
    ];

    /// Registry key.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::ReversionMomentum => "reversion_momentum",
            StrategyKind::ReversionMomentumRelaxed => "reversion_momentum_relaxed",
            StrategyKind::SmaTrend => "sma_trend",
        }
    }

    /// Simulator policy for the variant.
    pub fn profile(&self) -> StrategyProfile {
        match self {
            StrategyKind::ReversionMomentum => StrategyProfile::reversion_momentum(),
            StrategyKind::ReversionMomentumRelaxed => StrategyProfile::reversion_momentum_relaxed(),
            StrategyKind::SmaTrend => StrategyProfile::sma_trend(),
        }
    }

    fn default_config(&self) -> serde_json::Value {
        let value = match self {
            StrategyKind::ReversionMomentum => {
                serde_json::to_value(ReversionMomentumConfig::default())
            }
            StrategyKind::ReversionMomentumRelaxed => {
                serde_json::to_value(ReversionMomentumConfig::relaxed())
            }
            StrategyKind::SmaTrend => serde_json::to_value(SmaTrendConfig::default()),
        };
        value.unwrap_or_default()
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| StrategyError::NotFound(s.to_string()))
    }
}

/// Information about a registered strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Registry key
    pub name: String,
    pub kind: StrategyKind,
    /// Strategy description
    pub description: String,
    /// Default configuration as JSON
    pub default_config: serde_json::Value,
    /// Default simulator policy
    pub profile: StrategyProfile,
}

/// Recursively merge `overrides` into `base`. Objects merge key by key;
/// any other value replaces the base value.
pub fn merge_json(base: &mut serde_json::Value, overrides: &serde_json::Value) {
    match (base, overrides) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overrides) => *base = overrides.clone(),
    }
}

/// Registry for available strategies.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, StrategyInfo>,
}

impl StrategyRegistry {
    /// Create a new strategy registry with all built-in strategies.
    pub fn new() -> Self {
        let strategies = StrategyKind::ALL
            .into_iter()
            .map(|kind| {
                let description = match kind {
                    StrategyKind::ReversionMomentum => {
                        "Buys pullbacks in long-term uptrends with momentum and volume confirmation"
                    }
                    StrategyKind::ReversionMomentumRelaxed => {
                        "Reversion-momentum with looser entry filters and a wider stop"
                    }
                    StrategyKind::SmaTrend => {
                        "Holds assets trading above their 20-day SMA with a fixed stop-loss"
                    }
                };
                let info = StrategyInfo {
                    name: kind.as_str().to_string(),
                    kind,
                    description: description.to_string(),
                    default_config: kind.default_config(),
                    profile: kind.profile(),
                };
                (info.name.clone(), info)
            })
            .collect();

        Self { strategies }
    }

    /// List all available strategies.
    pub fn list(&self) -> Vec<&StrategyInfo> {
        self.strategies.values().collect()
    }

    /// Get strategy info by name.
    pub fn get(&self, name: &str) -> Option<&StrategyInfo> {
        self.strategies.get(name)
    }

    /// Check if a strategy exists.
    pub fn exists(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Get all strategy names.
    pub fn names(&self) -> Vec<&String> {
        self.strategies.keys().collect()
    }

    /// Default simulator policy for a strategy.
    pub fn profile(&self, name: &str) -> Result<StrategyProfile, StrategyError> {
        self.get(name)
            .map(|info| info.profile.clone())
            .ok_or_else(|| StrategyError::NotFound(name.to_string()))
    }

    /// Simulator policy with partial JSON overrides applied.
    pub fn profile_with_overrides(
        &self,
        name: &str,
        overrides: &serde_json::Value,
    ) -> Result<StrategyProfile, StrategyError> {
        let mut value = serde_json::to_value(self.profile(name)?)
            .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
        merge_json(&mut value, overrides);
        serde_json::from_value(value).map_err(|e| StrategyError::InvalidConfig(e.to_string()))
    }

    /// Create a strategy instance from a full configuration.
    pub fn create(
        &self,
        name: &str,
        config: serde_json::Value,
    ) -> Result<Box<dyn Strategy>, StrategyError> {
        let kind: StrategyKind = name.parse()?;
        match kind {
            StrategyKind::ReversionMomentum | StrategyKind::ReversionMomentumRelaxed => {
                let config: ReversionMomentumConfig = serde_json::from_value(config)
                    .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
                config.validate()?;
                Ok(Box::new(ReversionMomentumStrategy::new(kind.as_str(), config)))
            }
            StrategyKind::SmaTrend => {
                let config: SmaTrendConfig = serde_json::from_value(config)
                    .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
                config.validate()?;
                Ok(Box::new(SmaTrendStrategy::new(config)))
            }
        }
    }

    /// Create a strategy with default configuration.
    pub fn create_default(&self, name: &str) -> Result<Box<dyn Strategy>, StrategyError> {
        let info = self
            .get(name)
            .ok_or_else(|| StrategyError::NotFound(name.to_string()))?;
        self.create(name, info.default_config.clone())
    }

    /// Create a strategy from its defaults with partial JSON overrides.
    pub fn create_with_overrides(
        &self,
        name: &str,
        overrides: &serde_json::Value,
    ) -> Result<Box<dyn Strategy>, StrategyError> {
        let info = self
            .get(name)
            .ok_or_else(|| StrategyError::NotFound(name.to_string()))?;
        let mut config = info.default_config.clone();
        merge_json(&mut config, overrides);
        self.create(name, config)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenbt_core::{ExitCostPolicy, IndicatorSettings, Weighting};

    #[test]
    fn test_registry_list() {
        let registry = StrategyRegistry::new();
        let names: Vec<&str> = registry.list().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["reversion_momentum", "reversion_momentum_relaxed", "sma_trend"]
        );
    }

    #[test]
    fn test_registry_get() {
        let registry = StrategyRegistry::new();

        assert!(registry.get("sma_trend").is_some());
        assert!(registry.get("unknown").is_none());
        assert!(registry.exists("reversion_momentum"));
    }

    #[test]
    fn test_create_default() {
        let registry = StrategyRegistry::new();
        for name in registry.names() {
            let strategy = registry.create_default(name).unwrap();
            assert_eq!(strategy.name(), name.as_str());
            assert!(strategy
                .requirements()
                .check(&IndicatorSettings::default())
                .is_ok());
        }
    }

    #[test]
    fn test_create_unknown_strategy() {
        let registry = StrategyRegistry::new();
        assert!(matches!(
            registry.create_default("unknown"),
            Err(StrategyError::NotFound(_))
        ));
    }

    #[test]
    fn test_create_with_invalid_config() {
        let registry = StrategyRegistry::new();
        let result =
            registry.create_with_overrides("sma_trend", &serde_json::json!({ "sma_window": 0 }));
        match result {
            Err(StrategyError::InvalidConfig(msg)) => assert!(msg.contains("SMA window")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("zero SMA window accepted"),
        }
    }

    #[test]
    fn test_create_with_overrides() {
        let registry = StrategyRegistry::new();
        let strategy = registry
            .create_with_overrides("sma_trend", &serde_json::json!({ "sma_window": 50 }))
            .unwrap();
        assert_eq!(strategy.requirements().sma_windows, vec![50]);

        let bad = registry.create_with_overrides(
            "reversion_momentum",
            &serde_json::json!({ "exit": { "stop_loss": 0.2 } }),
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_canonical_profiles() {
        let registry = StrategyRegistry::new();

        let canonical = registry.profile("reversion_momentum").unwrap();
        assert_eq!(canonical.top_k, 8);
        assert_eq!(canonical.warmup_days, 200);
        assert_eq!(canonical.weighting, Weighting::EqualWeight);
        assert_eq!(canonical.exit_costs, ExitCostPolicy::None);
        assert_eq!(canonical.universe.min_observations, 730);

        let relaxed = registry.profile("reversion_momentum_relaxed").unwrap();
        assert_eq!(relaxed.top_k, 10);
        assert_eq!(relaxed.exit_costs, ExitCostPolicy::AllExits);
        assert!((relaxed.universe.min_market_cap - 1_000_000.0).abs() < 1e-6);
        assert!((relaxed.costs.pool_liquidity - 5_000_000.0).abs() < 1e-6);

        let trend = registry.profile("sma_trend").unwrap();
        assert_eq!(trend.warmup_days, 0);
        assert_eq!(trend.weighting, Weighting::CapitalWeight);
        assert_eq!(trend.exit_costs, ExitCostPolicy::StopLossOnly);
        assert_eq!(trend.universe.min_observations, 90);
    }

    #[test]
    fn test_profile_overrides() {
        let registry = StrategyRegistry::new();
        let profile = registry
            .profile_with_overrides(
                "sma_trend",
                &serde_json::json!({ "top_k": 1, "costs": { "fee_rate": 0.0 } }),
            )
            .unwrap();
        assert_eq!(profile.top_k, 1);
        assert_eq!(profile.costs.fee_rate, 0.0);
        assert!((profile.costs.gas_cost - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(
            "sma_trend".parse::<StrategyKind>().unwrap(),
            StrategyKind::SmaTrend
        );
        assert!("momentum".parse::<StrategyKind>().is_err());
        assert_eq!(StrategyKind::ReversionMomentumRelaxed.to_string(), "reversion_momentum_relaxed");
    }

    #[test]
    fn test_merge_json() {
        let mut base = serde_json::json!({ "a": 1, "b": { "c": 2, "d": 3 } });
        merge_json(&mut base, &serde_json::json!({ "b": { "d": 4 }, "e": 5 }));
        assert_eq!(base, serde_json::json!({ "a": 1, "b": { "c": 2, "d": 4 }, "e": 5 }));
    }
}
