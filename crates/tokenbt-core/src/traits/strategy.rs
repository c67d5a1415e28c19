//! Strategy trait definitions.

use crate::error::StrategyError;
use crate::types::{ExitReason, IndicatorFrame, IndicatorRow, IndicatorSettings, Position};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Configuration trait for strategies.
pub trait StrategyConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), StrategyError>;
}

/// A ranked rebalance candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub asset: String,
    pub score: f64,
}

/// Indicator windows a strategy reads from the frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicatorRequirements {
    pub sma_windows: Vec<usize>,
    pub momentum_windows: Vec<usize>,
}

impl IndicatorRequirements {
    /// Fail if the frame settings do not compute a required window.
    pub fn check(&self, settings: &IndicatorSettings) -> Result<(), StrategyError> {
        if let Some(&window) = self.sma_windows.iter().find(|&&w| !settings.has_sma(w)) {
            return Err(StrategyError::UnknownIndicatorWindow {
                indicator: "sma".into(),
                window,
            });
        }
        if let Some(&window) = self
            .momentum_windows
            .iter()
            .find(|&&w| !settings.has_momentum(w))
        {
            return Err(StrategyError::UnknownIndicatorWindow {
                indicator: "momentum".into(),
                window,
            });
        }
        Ok(())
    }
}

/// Core strategy trait.
///
/// A strategy ranks eligible assets at each rebalance and decides when a
/// held position should leave early. It never sees data past `date`.
pub trait Strategy: Send + Sync {
    /// Get the unique name of this strategy.
    fn name(&self) -> &str;

    /// Rank eligible assets on `date`, best first.
    ///
    /// An empty result means no asset qualified; the simulator then keeps
    /// the current positions.
    fn select_candidates(
        &self,
        eligible: &[String],
        frame: &IndicatorFrame,
        date: NaiveDate,
    ) -> Vec<Candidate>;

    /// Check exit conditions for a held position using today's row.
    fn exit_signal(&self, position: &Position, today: &IndicatorRow) -> Option<ExitReason>;

    /// Indicator windows read by this strategy.
    fn requirements(&self) -> IndicatorRequirements;

    /// Get a description of the strategy.
    fn description(&self) -> &str {
        ""
    }
}
