//! Mean reversion within a long-term uptrend.
//!
//! Buys assets trading above their long moving average that have pulled
//! back (low RSI or near the lower Bollinger Band) while medium-term
//! momentum and volume stay healthy. Positions exit on a stop-loss, an
//! overbought RSI or a push through the upper band.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokenbt_core::{
    error::StrategyError,
    traits::{Candidate, IndicatorRequirements, Strategy, StrategyConfig},
    types::{ExitReason, IndicatorFrame, IndicatorRow, Position},
};
use tokenbt_risk::ExitRules;
use tracing::trace;

use crate::scoring::{QualityWeights, ScoreInput};

/// Configuration for the reversion-momentum strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReversionMomentumConfig {
    /// Long-term trend SMA window
    pub trend_sma: usize,
    /// Enter when RSI is below this
    pub rsi_entry: f64,
    /// Or when the band position is below this
    pub band_entry: f64,
    /// Momentum horizon
    pub momentum_window: usize,
    /// Minimum momentum over the horizon
    pub min_momentum: f64,
    /// Minimum volume ratio
    pub min_volume_ratio: f64,
    pub exit: ExitRules,
    pub weights: QualityWeights,
}

impl Default for ReversionMomentumConfig {
    fn default() -> Self {
        Self {
            trend_sma: 200,
            rsi_entry: 40.0,
            band_entry: 0.3,
            momentum_window: 30,
            min_momentum: -0.10,
            min_volume_ratio: 0.8,
            exit: ExitRules {
                stop_loss: -0.10,
                rsi_ceiling: Some(70.0),
                band_ceiling: Some(0.95),
            },
            weights: QualityWeights::default(),
        }
    }
}

impl ReversionMomentumConfig {
    /// Looser entry thresholds and a wider stop.
    pub fn relaxed() -> Self {
        Self {
            rsi_entry: 50.0,
            band_entry: 0.4,
            min_momentum: -0.15,
            min_volume_ratio: 0.5,
            exit: ExitRules {
                stop_loss: -0.12,
                rsi_ceiling: Some(70.0),
                band_ceiling: Some(0.95),
            },
            ..Self::default()
        }
    }
}

impl StrategyConfig for ReversionMomentumConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.trend_sma == 0 || self.momentum_window == 0 {
            return Err(StrategyError::InvalidConfig(
                "Trend SMA and momentum windows must be greater than 0".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.rsi_entry) {
            return Err(StrategyError::InvalidConfig(
                "RSI entry must be between 0 and 100".into(),
            ));
        }
        if self.min_volume_ratio < 0.0 {
            return Err(StrategyError::InvalidConfig(
                "Minimum volume ratio must be non-negative".into(),
            ));
        }
        self.exit
            .validate()
            .map_err(|e| StrategyError::InvalidConfig(e.to_string()))
    }
}

/// Reversion-momentum rotation strategy.
pub struct ReversionMomentumStrategy {
    name: String,
    config: ReversionMomentumConfig,
}

impl ReversionMomentumStrategy {
    /// Create a new strategy with the given configuration.
    pub fn new(name: impl Into<String>, config: ReversionMomentumConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    pub fn config(&self) -> &ReversionMomentumConfig {
        &self.config
    }

    /// Check the entry conditions on one row.
    pub fn qualifies(&self, row: &IndicatorRow) -> bool {
        let c = &self.config;
        let Some(trend) = row.sma(c.trend_sma) else {
            return false;
        };
        let oversold = row.rsi.is_some_and(|rsi| rsi < c.rsi_entry)
            || row.bb_position.is_some_and(|pos| pos < c.band_entry);
        let momentum_ok = row
            .momentum(c.momentum_window)
            .is_some_and(|m| m > c.min_momentum);
        let volume_ok = row.volume_ratio.is_some_and(|vr| vr > c.min_volume_ratio);

        row.price > trend && oversold && momentum_ok && volume_ok
    }
}

impl Strategy for ReversionMomentumStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn select_candidates(
        &self,
        eligible: &[String],
        frame: &IndicatorFrame,
        date: NaiveDate,
    ) -> Vec<Candidate> {
        let inputs: Vec<ScoreInput> = eligible
            .iter()
            .filter_map(|asset| {
                let row = frame.row_on(asset, date)?;
                if !self.qualifies(row) {
                    return None;
                }
                ScoreInput::from_row(asset, row)
            })
            .collect();
        trace!(%date, qualified = inputs.len(), "Entry screen");
        self.config.weights.rank(inputs)
    }

    fn exit_signal(&self, position: &Position, today: &IndicatorRow) -> Option<ExitReason> {
        self.config.exit.check(position, today)
    }

    fn requirements(&self) -> IndicatorRequirements {
        IndicatorRequirements {
            sma_windows: vec![self.config.trend_sma],
            momentum_windows: vec![self.config.momentum_window],
        }
    }

    fn description(&self) -> &str {
        "Buys pullbacks in long-term uptrends with momentum and volume confirmation"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenbt_core::{AssetFrame, IndicatorSettings};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn row(price: f64, rsi: f64, bb: f64, mom: f64, vr: f64) -> IndicatorRow {
        let mut row = IndicatorRow::bare(date(), price, 1e7, 1e5);
        row.sma.insert(200, 100.0);
        row.rsi = Some(rsi);
        row.bb_position = Some(bb);
        row.momentum.insert(30, mom);
        row.volume_ratio = Some(vr);
        row.volatility = Some(0.8);
        row
    }

    fn strategy() -> ReversionMomentumStrategy {
        ReversionMomentumStrategy::new("reversion_momentum", ReversionMomentumConfig::default())
    }

    #[test]
    fn test_entry_conditions() {
        let s = strategy();
        assert!(s.qualifies(&row(110.0, 35.0, 0.5, 0.0, 1.0)));
        // oversold through the band instead of RSI
        assert!(s.qualifies(&row(110.0, 55.0, 0.2, 0.0, 1.0)));
        // below trend
        assert!(!s.qualifies(&row(95.0, 35.0, 0.2, 0.0, 1.0)));
        // not oversold
        assert!(!s.qualifies(&row(110.0, 55.0, 0.5, 0.0, 1.0)));
        // momentum too weak
        assert!(!s.qualifies(&row(110.0, 35.0, 0.2, -0.2, 1.0)));
        // volume too thin
        assert!(!s.qualifies(&row(110.0, 35.0, 0.2, 0.0, 0.7)));
    }

    #[test]
    fn test_relaxed_thresholds() {
        let relaxed = ReversionMomentumStrategy::new(
            "reversion_momentum_relaxed",
            ReversionMomentumConfig::relaxed(),
        );
        let r = row(110.0, 45.0, 0.5, -0.12, 0.6);
        assert!(relaxed.qualifies(&r));
        assert!(!strategy().qualifies(&r));
        assert!((relaxed.config().exit.stop_loss + 0.12).abs() < 1e-12);
    }

    #[test]
    fn test_missing_trend_does_not_qualify() {
        let mut r = row(110.0, 35.0, 0.2, 0.0, 1.0);
        r.sma.clear();
        assert!(!strategy().qualifies(&r));
    }

    #[test]
    fn test_select_candidates_ranked() {
        let frame = IndicatorFrame::new(
            IndicatorSettings::default(),
            vec![
                AssetFrame::new("AAA", vec![row(110.0, 38.0, 0.5, 0.0, 1.0)]),
                AssetFrame::new("BBB", vec![row(110.0, 20.0, 0.5, 0.0, 1.0)]),
                AssetFrame::new("CCC", vec![row(90.0, 20.0, 0.1, 0.0, 1.0)]),
            ],
        );
        let eligible = vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()];
        let ranked = strategy().select_candidates(&eligible, &frame, date());

        let assets: Vec<&str> = ranked.iter().map(|c| c.asset.as_str()).collect();
        assert_eq!(assets, vec!["BBB", "AAA"]);
    }

    #[test]
    fn test_only_eligible_assets_considered() {
        let frame = IndicatorFrame::new(
            IndicatorSettings::default(),
            vec![AssetFrame::new("AAA", vec![row(110.0, 20.0, 0.5, 0.0, 1.0)])],
        );
        assert!(strategy().select_candidates(&[], &frame, date()).is_empty());
    }

    #[test]
    fn test_exit_signal() {
        let s = strategy();
        let pos = Position::new("AAA", 100.0, 1_000.0, date());
        let mut today = row(89.0, 50.0, 0.5, 0.0, 1.0);
        assert_eq!(s.exit_signal(&pos, &today), Some(ExitReason::StopLoss));
        today.price = 105.0;
        today.rsi = Some(72.0);
        assert_eq!(s.exit_signal(&pos, &today), Some(ExitReason::Overbought));
    }

    #[test]
    fn test_config_validate() {
        assert!(ReversionMomentumConfig::default().validate().is_ok());
        let bad = ReversionMomentumConfig {
            trend_sma: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
