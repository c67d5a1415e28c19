//! Per-variant simulator policy.

use serde::{Deserialize, Serialize};
use tokenbt_core::{BacktestError, ExitCostPolicy, Weighting};
use tokenbt_risk::{CostModel, ReturnWindow, UniversePolicy};

/// Portfolio construction and friction policy for one strategy variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyProfile {
    /// Maximum number of positions held after a rebalance
    pub top_k: usize,
    /// Day index of the first possible rebalance
    pub warmup_days: usize,
    pub weighting: Weighting,
    pub exit_costs: ExitCostPolicy,
    pub universe: UniversePolicy,
    pub costs: CostModel,
}

impl StrategyProfile {
    /// Canonical reversion-momentum policy.
    pub fn reversion_momentum() -> Self {
        Self {
            top_k: 8,
            warmup_days: 200,
            weighting: Weighting::EqualWeight,
            exit_costs: ExitCostPolicy::None,
            universe: UniversePolicy::default(),
            costs: CostModel::default(),
        }
    }

    /// Relaxed reversion-momentum policy.
    pub fn reversion_momentum_relaxed() -> Self {
        Self {
            top_k: 10,
            warmup_days: 200,
            weighting: Weighting::EqualWeight,
            exit_costs: ExitCostPolicy::AllExits,
            universe: UniversePolicy {
                min_market_cap: 1_000_000.0,
                max_abs_daily_return: 3.0,
                ..UniversePolicy::default()
            },
            costs: CostModel::with_liquidity(5_000_000.0),
        }
    }

    /// SMA trend policy.
    pub fn sma_trend() -> Self {
        Self {
            top_k: 10,
            warmup_days: 0,
            weighting: Weighting::CapitalWeight,
            exit_costs: ExitCostPolicy::StopLossOnly,
            universe: UniversePolicy {
                min_observations: 90,
                return_window: ReturnWindow::Trailing { days: 30 },
                ..UniversePolicy::default()
            },
            costs: CostModel::with_liquidity(100_000_000.0),
        }
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.top_k == 0 {
            return Err(BacktestError::Configuration(
                "Position count (top_k) must be greater than 0".into(),
            ));
        }
        self.universe.validate()?;
        self.costs.validate()
    }
}
