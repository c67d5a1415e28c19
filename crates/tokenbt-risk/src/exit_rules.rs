//! Early exit rules for held positions.

use serde::{Deserialize, Serialize};
use tokenbt_core::{BacktestError, ExitReason, IndicatorRow, Position};

/// Exit thresholds, checked in priority order: stop-loss, overbought RSI,
/// upper Bollinger Band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRules {
    /// Exit when the return since entry falls below this (e.g. -0.10)
    pub stop_loss: f64,
    /// Exit when RSI rises above this
    pub rsi_ceiling: Option<f64>,
    /// Exit when the band position rises above this
    pub band_ceiling: Option<f64>,
}

impl Default for ExitRules {
    fn default() -> Self {
        Self {
            stop_loss: -0.10,
            rsi_ceiling: Some(70.0),
            band_ceiling: Some(0.95),
        }
    }
}

impl ExitRules {
    /// Stop-loss only.
    pub fn stop_loss_only(stop_loss: f64) -> Self {
        Self {
            stop_loss,
            rsi_ceiling: None,
            band_ceiling: None,
        }
    }

    /// Evaluate today's row against the rules.
    pub fn check(&self, position: &Position, today: &IndicatorRow) -> Option<ExitReason> {
        if position.total_return(today.price) < self.stop_loss {
            return Some(ExitReason::StopLoss);
        }
        if let (Some(ceiling), Some(rsi)) = (self.rsi_ceiling, today.rsi) {
            if rsi > ceiling {
                return Some(ExitReason::Overbought);
            }
        }
        if let (Some(ceiling), Some(position)) = (self.band_ceiling, today.bb_position) {
            if position > ceiling {
                return Some(ExitReason::UpperBand);
            }
        }
        None
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        if !(self.stop_loss < 0.0 && self.stop_loss > -1.0) {
            return Err(BacktestError::Configuration(format!(
                "Stop-loss must be within (-1, 0), got {}",
                self.stop_loss
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    fn row(price: f64, rsi: Option<f64>, bb: Option<f64>) -> IndicatorRow {
        let mut row = IndicatorRow::bare(date(), price, 1e7, 1.0);
        row.rsi = rsi;
        row.bb_position = bb;
        row
    }

    #[test]
    fn test_priority_order() {
        let rules = ExitRules::default();
        let pos = Position::new("ARB", 10.0, 1_000.0, date());

        // Stop-loss wins over overbought signals
        assert_eq!(
            rules.check(&pos, &row(8.5, Some(90.0), Some(1.2))),
            Some(ExitReason::StopLoss)
        );
        assert_eq!(
            rules.check(&pos, &row(11.0, Some(75.0), Some(1.2))),
            Some(ExitReason::Overbought)
        );
        assert_eq!(
            rules.check(&pos, &row(11.0, Some(60.0), Some(0.96))),
            Some(ExitReason::UpperBand)
        );
        assert_eq!(rules.check(&pos, &row(11.0, Some(60.0), Some(0.9))), None);
    }

    #[test]
    fn test_missing_indicators_do_not_exit() {
        let rules = ExitRules::default();
        let pos = Position::new("ARB", 10.0, 1_000.0, date());
        assert_eq!(rules.check(&pos, &row(10.5, None, None)), None);
    }

    #[test]
    fn test_stop_loss_boundary() {
        let rules = ExitRules::stop_loss_only(-0.08);
        let pos = Position::new("ARB", 100.0, 1_000.0, date());
        assert_eq!(rules.check(&pos, &row(92.5, Some(99.0), Some(2.0))), None);
        assert_eq!(
            rules.check(&pos, &row(91.0, None, None)),
            Some(ExitReason::StopLoss)
        );
    }

    #[test]
    fn test_validate() {
        assert!(ExitRules::default().validate().is_ok());
        assert!(ExitRules::stop_loss_only(0.05).validate().is_err());
    }
}
