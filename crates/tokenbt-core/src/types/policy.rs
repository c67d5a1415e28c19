//! Per-strategy policy constants for the simulator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How held positions are blended into the daily portfolio return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// Each held position counts 1/n of the day's return
    #[default]
    EqualWeight,
    /// Each position counts by its marked value over start-of-day capital
    CapitalWeight,
}

/// Which exits pay slippage and transaction costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitCostPolicy {
    #[default]
    None,
    StopLossOnly,
    AllExits,
}

impl ExitCostPolicy {
    /// Whether an exit for `reason` is charged costs.
    pub fn applies_to(self, reason: ExitReason) -> bool {
        match self {
            ExitCostPolicy::None => false,
            ExitCostPolicy::StopLossOnly => reason == ExitReason::StopLoss,
            ExitCostPolicy::AllExits => true,
        }
    }
}

/// Why a position was closed between rebalances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    Overbought,
    UpperBand,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::Overbought => write!(f, "overbought"),
            ExitReason::UpperBand => write!(f, "upper_band"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_cost_policy() {
        assert!(!ExitCostPolicy::None.applies_to(ExitReason::StopLoss));
        assert!(ExitCostPolicy::StopLossOnly.applies_to(ExitReason::StopLoss));
        assert!(!ExitCostPolicy::StopLossOnly.applies_to(ExitReason::Overbought));
        assert!(ExitCostPolicy::AllExits.applies_to(ExitReason::UpperBand));
    }

    #[test]
    fn test_policy_serde_names() {
        assert_eq!(
            serde_json::to_string(&Weighting::CapitalWeight).unwrap(),
            "\"capital_weight\""
        );
        let policy: ExitCostPolicy = serde_json::from_str("\"stop_loss_only\"").unwrap();
        assert_eq!(policy, ExitCostPolicy::StopLossOnly);
        assert_eq!(ExitReason::UpperBand.to_string(), "upper_band");
    }
}
