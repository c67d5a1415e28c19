//! Short-term trend following on a single moving average.
//!
//! Holds assets trading above their SMA, exiting only on the stop-loss.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokenbt_core::{
    error::StrategyError,
    traits::{Candidate, IndicatorRequirements, Strategy, StrategyConfig},
    types::{ExitReason, IndicatorFrame, IndicatorRow, Position},
};
use tokenbt_risk::ExitRules;

use crate::scoring::{QualityWeights, ScoreInput};

/// Configuration for the SMA trend strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmaTrendConfig {
    /// SMA window the price must be above
    pub sma_window: usize,
    pub exit: ExitRules,
    pub weights: QualityWeights,
}

impl Default for SmaTrendConfig {
    fn default() -> Self {
        Self {
            sma_window: 20,
            exit: ExitRules::stop_loss_only(-0.08),
            weights: QualityWeights::default(),
        }
    }
}

impl StrategyConfig for SmaTrendConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.sma_window == 0 {
            return Err(StrategyError::InvalidConfig(
                "SMA window must be greater than 0".into(),
            ));
        }
        self.exit
            .validate()
            .map_err(|e| StrategyError::InvalidConfig(e.to_string()))
    }
}

/// SMA trend strategy.
pub struct SmaTrendStrategy {
    config: SmaTrendConfig,
}

impl SmaTrendStrategy {
    /// Create a new SMA trend strategy.
    pub fn new(config: SmaTrendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SmaTrendConfig {
        &self.config
    }

    fn qualifies(&self, row: &IndicatorRow) -> bool {
        row.sma(self.config.sma_window)
            .is_some_and(|sma| row.price > sma)
    }
}

impl Strategy for SmaTrendStrategy {
    fn name(&self) -> &str {
        "sma_trend"
    }

    fn select_candidates(
        &self,
        eligible: &[String],
        frame: &IndicatorFrame,
        date: NaiveDate,
    ) -> Vec<Candidate> {
        let inputs = eligible
            .iter()
            .filter_map(|asset| {
                let row = frame.row_on(asset, date)?;
                self.qualifies(row)
                    .then(|| ScoreInput::from_row(asset, row))
                    .flatten()
            })
            .collect();
        self.config.weights.rank(inputs)
    }

    fn exit_signal(&self, position: &Position, today: &IndicatorRow) -> Option<ExitReason> {
        self.config.exit.check(position, today)
    }

    fn requirements(&self) -> IndicatorRequirements {
        IndicatorRequirements {
            sma_windows: vec![self.config.sma_window],
            momentum_windows: vec![],
        }
    }

    fn description(&self) -> &str {
        "Holds assets trading above their 20-day SMA with a fixed stop-loss"
    }
}
