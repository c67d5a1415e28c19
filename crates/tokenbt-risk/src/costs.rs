//! Trading friction model: AMM slippage and transaction costs.

use serde::{Deserialize, Serialize};
use tokenbt_core::BacktestError;

/// Slippage step: trades below `max_ratio` of pool liquidity pay `slippage`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlippageTier {
    pub max_ratio: f64,
    pub slippage: f64,
}

/// Price impact model as a function of trade size over pool liquidity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum SlippageModel {
    /// Step function over ascending ratio tiers
    Tiered {
        tiers: Vec<SlippageTier>,
        /// Slippage for ratios above the last tier
        fallback: f64,
        cap: f64,
    },
    /// Constant-product pool approximation `x / (1 - x)`
    ConstantProduct { cap: f64 },
}

impl Default for SlippageModel {
    fn default() -> Self {
        SlippageModel::Tiered {
            tiers: vec![
                SlippageTier {
                    max_ratio: 0.001,
                    slippage: 0.0001,
                },
                SlippageTier {
                    max_ratio: 0.01,
                    slippage: 0.0005,
                },
                SlippageTier {
                    max_ratio: 0.05,
                    slippage: 0.0015,
                },
            ],
            fallback: 0.003,
            cap: 0.005,
        }
    }
}

impl SlippageModel {
    /// Slippage fraction for a trade of `notional` against `liquidity`.
    ///
    /// Zero when the pool has no liquidity; never above the cap.
    pub fn slippage(&self, notional: f64, liquidity: f64) -> f64 {
        if liquidity <= 0.0 || notional <= 0.0 {
            return 0.0;
        }
        let ratio = notional / liquidity;
        match self {
            SlippageModel::Tiered {
                tiers,
                fallback,
                cap,
            } => tiers
                .iter()
                .find(|tier| ratio < tier.max_ratio)
                .map_or(*fallback, |tier| tier.slippage)
                .min(*cap),
            SlippageModel::ConstantProduct { cap } => {
                if ratio >= 1.0 {
                    *cap
                } else {
                    (ratio / (1.0 - ratio)).min(*cap)
                }
            }
        }
    }

    /// Check that the model is non-decreasing and non-negative.
    pub fn validate(&self) -> Result<(), BacktestError> {
        match self {
            SlippageModel::Tiered {
                tiers,
                fallback,
                cap,
            } => {
                if *cap < 0.0 || *fallback < 0.0 {
                    return Err(BacktestError::Configuration(
                        "Slippage cap and fallback must be non-negative".into(),
                    ));
                }
                let mut prev: Option<&SlippageTier> = None;
                for tier in tiers {
                    if tier.slippage < 0.0 || tier.max_ratio <= 0.0 {
                        return Err(BacktestError::Configuration(
                            "Slippage tiers must be positive".into(),
                        ));
                    }
                    if let Some(p) = prev {
                        if tier.max_ratio <= p.max_ratio || tier.slippage < p.slippage {
                            return Err(BacktestError::Configuration(
                                "Slippage tiers must be ascending".into(),
                            ));
                        }
                    }
                    prev = Some(tier);
                }
                if prev.is_some_and(|p| *fallback < p.slippage) {
                    return Err(BacktestError::Configuration(
                        "Slippage fallback must not be below the last tier".into(),
                    ));
                }
                Ok(())
            }
            SlippageModel::ConstantProduct { cap } => {
                if *cap < 0.0 {
                    return Err(BacktestError::Configuration(
                        "Slippage cap must be non-negative".into(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Slippage fraction under the default tiered model.
pub fn slippage(trade_notional: f64, pool_liquidity: f64) -> f64 {
    SlippageModel::default().slippage(trade_notional, pool_liquidity)
}

/// Linear fee plus a fixed gas cost, in currency units.
pub fn transaction_cost(trade_notional: f64, fee_rate: f64, fixed_gas_cost: f64) -> f64 {
    trade_notional * fee_rate + fixed_gas_cost
}

/// Cost parameters applied by the simulator at entry and on charged exits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// DEX fee as a fraction of notional
    pub fee_rate: f64,
    /// Fixed gas cost per trade
    pub gas_cost: f64,
    /// Assumed pool liquidity for slippage; zero disables slippage
    pub pool_liquidity: f64,
    pub slippage: SlippageModel,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            fee_rate: 0.0008,
            gas_cost: 0.08,
            pool_liquidity: 0.0,
            slippage: SlippageModel::default(),
        }
    }
}

impl CostModel {
    /// A model with no frictions at all.
    pub fn zero() -> Self {
        Self {
            fee_rate: 0.0,
            gas_cost: 0.0,
            pool_liquidity: 0.0,
            slippage: SlippageModel::default(),
        }
    }

    /// Default fees with slippage against the given pool liquidity.
    pub fn with_liquidity(pool_liquidity: f64) -> Self {
        Self {
            pool_liquidity,
            ..Self::default()
        }
    }

    pub fn slippage(&self, notional: f64) -> f64 {
        self.slippage.slippage(notional, self.pool_liquidity)
    }

    pub fn transaction_cost(&self, notional: f64) -> f64 {
        transaction_cost(notional, self.fee_rate, self.gas_cost)
    }

    /// Transaction cost as a fraction of the traded notional.
    pub fn cost_fraction(&self, notional: f64) -> f64 {
        if notional > 0.0 {
            self.transaction_cost(notional) / notional
        } else {
            0.0
        }
    }

    /// Return deducted from a position closed at `notional`.
    pub fn exit_penalty(&self, notional: f64) -> f64 {
        self.slippage(notional) + self.cost_fraction(notional)
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        let finite = self.fee_rate.is_finite()
            && self.gas_cost.is_finite()
            && self.pool_liquidity.is_finite();
        if !finite || self.fee_rate < 0.0 || self.gas_cost < 0.0 || self.pool_liquidity < 0.0 {
            return Err(BacktestError::Configuration(
                "Fee rate, gas cost and pool liquidity must be non-negative".into(),
            ));
        }
        self.slippage.validate()
    }
}
