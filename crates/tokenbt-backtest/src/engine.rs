//! Backtesting engine.
//!
//! A sequential fold over the frame's dates. Each day, in order:
//! held positions are marked from their last observed price to today's,
//! exit rules are checked on today's row, capital compounds by the blended
//! return, and a rebalance may replace the position set at today's prices.
//! New positions begin earning on the following day.

use chrono::NaiveDate;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tokenbt_core::traits::Strategy;
use tokenbt_core::types::{
    ExitReason, IndicatorFrame, IndicatorSettings, PortfolioState, PortfolioValueSeries, Position,
    PricePanel, Weighting,
};
use tokenbt_core::{BacktestError, BacktestResult};
use tokenbt_indicators::IndicatorEngine;
use tokenbt_risk::UniverseFilter;
use tokenbt_strategies::StrategyProfile;
use tracing::{debug, info, warn};

use crate::report::BacktestReport;
use crate::statistics::PerformanceMetrics;

/// Backtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Initial capital
    pub initial_capital: Decimal,
    /// Days between rebalances
    pub rebalance_days: usize,
    /// Portfolio construction and friction policy
    pub profile: StrategyProfile,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(10000),
            rebalance_days: 7,
            profile: StrategyProfile::reversion_momentum(),
        }
    }
}

impl BacktestConfig {
    /// Create a configuration for a strategy profile.
    pub fn new(profile: StrategyProfile) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }

    /// Validate parameters and return the initial capital as f64.
    pub fn validate(&self) -> Result<f64, BacktestError> {
        if self.rebalance_days == 0 {
            return Err(BacktestError::Configuration(
                "Rebalance interval must be greater than 0".into(),
            ));
        }
        let capital = self
            .initial_capital
            .to_f64()
            .filter(|c| c.is_finite() && *c > 0.0)
            .ok_or_else(|| {
                BacktestError::Configuration(format!(
                    "Initial capital must be positive, got {}",
                    self.initial_capital
                ))
            })?;
        self.profile.validate()?;
        Ok(capital)
    }
}

/// A completed rebalance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceRecord {
    pub date: NaiveDate,
    pub assets: Vec<String>,
    /// Capital allocated to each asset
    pub allocation: f64,
}

/// A position closed by an exit rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRecord {
    pub date: NaiveDate,
    pub asset: String,
    pub reason: ExitReason,
    /// Return since entry at the exit price
    pub total_return: f64,
}

/// Raw simulator output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub series: PortfolioValueSeries,
    pub rebalances: Vec<RebalanceRecord>,
    pub exits: Vec<ExitRecord>,
    /// Held-position days with no observation
    pub missing_observations: usize,
}

/// Backtesting engine.
pub struct BacktestEngine {
    config: BacktestConfig,
    indicators: IndicatorEngine,
}

impl BacktestEngine {
    /// Create a new backtest engine with default indicator settings.
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            config,
            indicators: IndicatorEngine::default(),
        }
    }

    /// Use custom indicator windows when running from a price panel.
    pub fn with_indicator_settings(mut self, settings: IndicatorSettings) -> BacktestResult<Self> {
        self.indicators = IndicatorEngine::new(settings)?;
        Ok(self)
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Simulate the strategy over every date in the frame.
    pub fn simulate(
        &self,
        strategy: &dyn Strategy,
        frame: &IndicatorFrame,
    ) -> BacktestResult<SimulationOutput> {
        let initial_capital = self.config.validate()?;
        strategy.requirements().check(frame.settings())?;

        let profile = &self.config.profile;
        let universe = UniverseFilter::new(profile.universe.clone());
        let mut state = PortfolioState::new(initial_capital);
        let mut output = SimulationOutput::default();

        for (day, &date) in frame.dates().iter().enumerate() {
            let start_capital = state.capital;
            let held = state.open_positions();
            let mut blended = 0.0;
            let mut exited = Vec::new();

            for position in state.positions.values_mut() {
                let Some(row) = frame.row_on(&position.asset, date) else {
                    debug!(asset = %position.asset, %date, "Missing observation for held position");
                    output.missing_observations += 1;
                    continue;
                };

                let weight = match profile.weighting {
                    Weighting::EqualWeight => 1.0 / held as f64,
                    Weighting::CapitalWeight if start_capital > 0.0 => position.value / start_capital,
                    Weighting::CapitalWeight => 0.0,
                };
                blended += weight * position.mark_to(row.price);

                if let Some(reason) = strategy.exit_signal(position, row) {
                    if profile.exit_costs.applies_to(reason) {
                        blended -= weight * profile.costs.exit_penalty(position.value);
                    }
                    let total_return = position.total_return(row.price);
                    debug!(asset = %position.asset, %date, %reason, total_return, "Exit");
                    output.exits.push(ExitRecord {
                        date,
                        asset: position.asset.clone(),
                        reason,
                        total_return,
                    });
                    exited.push(position.asset.clone());
                }
            }

            state.capital *= 1.0 + blended;
            for asset in &exited {
                state.positions.remove(asset);
            }

            if state.rebalance_due(day, profile.warmup_days, self.config.rebalance_days) {
                self.rebalance(strategy, frame, &universe, &mut state, day, date, &mut output);
            }

            if day >= profile.warmup_days {
                output
                    .series
                    .push(date, state.capital, state.open_positions());
            }
        }

        Ok(output)
    }

    #[allow(clippy::too_many_arguments)]
    fn rebalance(
        &self,
        strategy: &dyn Strategy,
        frame: &IndicatorFrame,
        universe: &UniverseFilter,
        state: &mut PortfolioState,
        day: usize,
        date: NaiveDate,
        output: &mut SimulationOutput,
    ) {
        let profile = &self.config.profile;
        let eligible = universe.eligible(frame, date);
        let selected: Vec<_> = strategy
            .select_candidates(&eligible, frame, date)
            .into_iter()
            .filter_map(|candidate| {
                frame
                    .row_on(&candidate.asset, date)
                    .map(|row| (candidate.asset, row.price))
            })
            .take(profile.top_k)
            .collect();

        if selected.is_empty() {
            debug!(%date, eligible = eligible.len(), "No qualifying candidates, keeping positions");
            return;
        }

        let allocation = state.capital / selected.len() as f64;
        let cost_fraction = profile.costs.cost_fraction(allocation);
        let positions = selected.iter().map(|(asset, price)| {
            Position::new(asset.clone(), price * (1.0 + cost_fraction), allocation, date)
                .with_last_price(*price)
        });
        state.replace_positions(positions, day);

        let assets: Vec<String> = selected.into_iter().map(|(asset, _)| asset).collect();
        debug!(%date, ?assets, allocation, "Rebalance");
        output.rebalances.push(RebalanceRecord {
            date,
            assets,
            allocation,
        });
    }

    /// Simulate and analyze a precomputed indicator frame.
    pub fn run(
        &self,
        strategy: &dyn Strategy,
        frame: &IndicatorFrame,
    ) -> BacktestResult<BacktestReport> {
        info!(
            strategy = strategy.name(),
            assets = frame.asset_count(),
            dates = frame.dates().len(),
            "Starting backtest"
        );

        let output = self.simulate(strategy, frame)?;
        if output.missing_observations > 0 {
            warn!(
                count = output.missing_observations,
                "Held positions had missing observations"
            );
        }

        let initial_capital = self.config.validate()?;
        let metrics = PerformanceMetrics::compute(&output.series, initial_capital)?;

        info!(
            final_value = metrics.final_value,
            total_return = metrics.total_return,
            sharpe = metrics.sharpe_ratio,
            max_drawdown = metrics.max_drawdown,
            rebalances = output.rebalances.len(),
            exits = output.exits.len(),
            "Backtest complete"
        );

        Ok(BacktestReport {
            strategy: strategy.name().to_string(),
            config: self.config.clone(),
            metrics,
            series: output.series,
            rebalances: output.rebalances,
            exits: output.exits,
            missing_observations: output.missing_observations,
        })
    }

    /// Compute indicators for a price panel, then run.
    pub fn run_panel(
        &self,
        strategy: &dyn Strategy,
        panel: &PricePanel,
    ) -> BacktestResult<BacktestReport> {
        let frame = self.indicators.compute(panel);
        self.run(strategy, &frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tokenbt_core::{
        AssetFrame, Candidate, ExitCostPolicy, IndicatorRequirements, IndicatorRow,
        PriceObservation,
    };
    use tokenbt_risk::{CostModel, ExitRules, UniversePolicy};
    use tokenbt_strategies::{SmaTrendConfig, SmaTrendStrategy, StrategyRegistry};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
    }

    fn date(day: usize) -> NaiveDate {
        start() + Duration::days(day as i64)
    }

    /// Three assets: a linear uptrend doubling over the horizon, a flat
    /// asset and a declining one.
    fn trend_panel(days: usize, up_price: impl Fn(usize) -> f64) -> Vec<PriceObservation> {
        let mut obs = Vec::new();
        for i in 0..days {
            obs.push(PriceObservation::new("UP", date(i), up_price(i), 1e7, 1_000.0));
            obs.push(PriceObservation::new("FLAT", date(i), 1.0, 1e7, 1_000.0));
            obs.push(PriceObservation::new(
                "DOWN",
                date(i),
                2.0 - i as f64 / days as f64,
                1e7,
                1_000.0,
            ));
        }
        obs
    }

    fn linear(days: usize) -> impl Fn(usize) -> f64 {
        move |i| 1.0 + i as f64 / (days - 1) as f64
    }

    fn frictionless_trend_engine() -> BacktestEngine {
        let profile = StrategyProfile {
            top_k: 1,
            costs: CostModel::zero(),
            ..StrategyProfile::sma_trend()
        };
        BacktestEngine::new(BacktestConfig::new(profile))
    }

    fn frame(obs: Vec<PriceObservation>) -> IndicatorFrame {
        IndicatorEngine::default().compute(&PricePanel::from_observations(obs).unwrap())
    }

    fn sma_trend() -> SmaTrendStrategy {
        SmaTrendStrategy::new(SmaTrendConfig::default())
    }

    #[test]
    fn test_uptrend_tracks_asset() {
        let days = 250;
        let price = linear(days);
        let frame = frame(trend_panel(days, &price));
        let engine = frictionless_trend_engine();

        let output = engine.simulate(&sma_trend(), &frame).unwrap();
        let points = output.series.points();
        assert_eq!(points.len(), days);

        // The universe needs 90 observations, so the first entry is day 89
        let first = output.rebalances.first().unwrap();
        assert_eq!(first.date, date(89));
        assert_eq!(first.assets, vec!["UP"]);
        assert!(points[..89].iter().all(|p| p.open_position_count == 0));
        assert!(points[89..].iter().all(|p| p.open_position_count == 1));
        assert!(points[..=89]
            .iter()
            .all(|p| (p.portfolio_value - 10_000.0).abs() < 1e-9));

        let expected = 10_000.0 * price(days - 1) / price(89);
        let final_value = output.series.last().unwrap().portfolio_value;
        assert!((final_value - expected).abs() < 1e-6 * expected);
        assert!(output.exits.is_empty());
        assert_eq!(output.missing_observations, 0);
    }

    #[test]
    fn test_stop_loss_removes_position_next_day() {
        let days = 100;
        // Uptrend until day 89, then a 20% drop that holds
        let price = |i: usize| {
            let base = 1.0 + i.min(89) as f64 * 0.01;
            if i >= 90 {
                base * 0.8
            } else {
                base
            }
        };
        let frame = frame(trend_panel(days, price));
        let engine = frictionless_trend_engine();

        let output = engine.simulate(&sma_trend(), &frame).unwrap();
        let points = output.series.points();

        assert_eq!(output.rebalances[0].date, date(89));
        assert_eq!(points[89].open_position_count, 1);
        assert_eq!(points[90].open_position_count, 0);
        assert_eq!(output.exits.len(), 1);
        assert_eq!(output.exits[0].date, date(90));
        assert_eq!(output.exits[0].reason, ExitReason::StopLoss);

        // The exit day still carries the loss, nothing after it moves
        let at_entry = points[89].portfolio_value;
        assert!((points[90].portfolio_value - at_entry * 0.8).abs() < 1e-6);
        assert!(points[90..]
            .iter()
            .all(|p| p.portfolio_value == points[90].portfolio_value && p.open_position_count == 0));
    }

    #[test]
    fn test_exit_costs_charged_on_stop_loss() {
        let days = 100;
        let price = |i: usize| {
            let base = 1.0 + i.min(89) as f64 * 0.01;
            if i >= 90 {
                base * 0.8
            } else {
                base
            }
        };
        let frame = frame(trend_panel(days, price));
        let profile = StrategyProfile {
            top_k: 1,
            exit_costs: ExitCostPolicy::StopLossOnly,
            costs: CostModel {
                fee_rate: 0.001,
                gas_cost: 0.0,
                pool_liquidity: 0.0,
                ..CostModel::default()
            },
            ..StrategyProfile::sma_trend()
        };
        let engine = BacktestEngine::new(BacktestConfig::new(profile));

        let output = engine.simulate(&sma_trend(), &frame).unwrap();
        let points = output.series.points();
        let expected = points[89].portfolio_value * (1.0 - 0.2 - 0.001);
        assert!((points[90].portfolio_value - expected).abs() < 1e-6);
        // Entry price carries the fee
        assert!(output.exits[0].total_return < -0.2);
    }

    /// Holds every eligible asset and exits on the reversion rules.
    struct HoldEligible;

    impl Strategy for HoldEligible {
        fn name(&self) -> &str {
            "hold_eligible"
        }

        fn select_candidates(
            &self,
            eligible: &[String],
            _frame: &IndicatorFrame,
            _date: NaiveDate,
        ) -> Vec<Candidate> {
            eligible
                .iter()
                .map(|asset| Candidate {
                    asset: asset.clone(),
                    score: 1.0,
                })
                .collect()
        }

        fn exit_signal(&self, position: &Position, today: &IndicatorRow) -> Option<ExitReason> {
            ExitRules::default().check(position, today)
        }

        fn requirements(&self) -> IndicatorRequirements {
            IndicatorRequirements::default()
        }
    }

    fn row(day: usize, price: f64, rsi: Option<f64>, bb_position: Option<f64>) -> IndicatorRow {
        let mut row = IndicatorRow::bare(date(day), price, 1e7, 1_000.0);
        row.rsi = rsi;
        row.bb_position = bb_position;
        row
    }

    /// A turns overbought on day 1; B rallies 20% on day 2 and touches
    /// the upper band.
    fn partial_exit_frame() -> IndicatorFrame {
        let a = AssetFrame::new(
            "A",
            vec![
                row(0, 100.0, None, None),
                row(1, 110.0, Some(80.0), None),
                row(2, 110.0, None, None),
                row(3, 110.0, None, None),
            ],
        );
        let b = AssetFrame::new(
            "B",
            vec![
                row(0, 100.0, None, None),
                row(1, 100.0, None, None),
                row(2, 120.0, None, Some(0.97)),
                row(3, 120.0, None, None),
            ],
        );
        IndicatorFrame::new(IndicatorSettings::default(), [a, b])
    }

    fn partial_exit_engine(
        weighting: Weighting,
        exit_costs: ExitCostPolicy,
        costs: CostModel,
    ) -> BacktestEngine {
        let profile = StrategyProfile {
            top_k: 2,
            warmup_days: 0,
            weighting,
            exit_costs,
            universe: UniversePolicy {
                min_observations: 1,
                min_market_cap: 0.0,
                excluded_assets: Default::default(),
                ..UniversePolicy::default()
            },
            costs,
        };
        let mut config = BacktestConfig::new(profile);
        config.rebalance_days = 30;
        BacktestEngine::new(config)
    }

    fn values(output: &SimulationOutput) -> Vec<(f64, usize)> {
        output
            .series
            .points()
            .iter()
            .map(|p| (p.portfolio_value, p.open_position_count))
            .collect()
    }

    fn assert_series(actual: &[(f64, usize)], expected: &[(f64, usize)]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a.0 - e.0).abs() < 1e-6, "value {} != {}", a.0, e.0);
            assert_eq!(a.1, e.1);
        }
    }

    #[test]
    fn test_weighting_after_partial_exit() {
        let frame = partial_exit_frame();

        let equal =
            partial_exit_engine(Weighting::EqualWeight, ExitCostPolicy::None, CostModel::zero())
                .simulate(&HoldEligible, &frame)
                .unwrap();
        assert_eq!(equal.rebalances.len(), 1);
        assert_eq!(equal.exits[0].asset, "A");
        assert_eq!(equal.exits[0].date, date(1));
        assert_eq!(equal.exits[0].reason, ExitReason::Overbought);
        // The survivor carries the whole portfolio once it holds alone
        assert_series(
            &values(&equal),
            &[(10_000.0, 2), (10_500.0, 1), (12_600.0, 0), (12_600.0, 0)],
        );

        let capital =
            partial_exit_engine(Weighting::CapitalWeight, ExitCostPolicy::None, CostModel::zero())
                .simulate(&HoldEligible, &frame)
                .unwrap();
        // Proceeds from the exit sit in cash
        assert_series(
            &values(&capital),
            &[(10_000.0, 2), (10_500.0, 1), (11_500.0, 0), (11_500.0, 0)],
        );
    }

    #[test]
    fn test_all_exits_policy_charges_signal_exits() {
        let frame = partial_exit_frame();
        let costs = CostModel {
            fee_rate: 0.001,
            gas_cost: 0.0,
            pool_liquidity: 0.0,
            ..CostModel::default()
        };

        let charged =
            partial_exit_engine(Weighting::EqualWeight, ExitCostPolicy::AllExits, costs.clone())
                .simulate(&HoldEligible, &frame)
                .unwrap();
        let reasons: Vec<ExitReason> = charged.exits.iter().map(|e| e.reason).collect();
        assert_eq!(reasons, vec![ExitReason::Overbought, ExitReason::UpperBand]);

        // Day 1: half weight on +10% less half of the 0.1% penalty
        let day1 = 10_000.0 * (1.0 + 0.5 * 0.1 - 0.5 * 0.001);
        let day2 = day1 * (1.0 + 0.2 - 0.001);
        assert_series(
            &values(&charged),
            &[(10_000.0, 2), (day1, 1), (day2, 0), (day2, 0)],
        );

        let free =
            partial_exit_engine(Weighting::EqualWeight, ExitCostPolicy::StopLossOnly, costs)
                .simulate(&HoldEligible, &frame)
                .unwrap();
        assert_series(
            &values(&free),
            &[(10_000.0, 2), (10_500.0, 1), (12_600.0, 0), (12_600.0, 0)],
        );
    }

    #[test]
    fn test_missing_observation_contributes_zero() {
        let days = 150;
        let price = linear(days);
        let obs: Vec<PriceObservation> = trend_panel(days, &price)
            .into_iter()
            .filter(|o| !(o.asset == "UP" && o.date == date(120)))
            .collect();
        let frame = frame(obs);
        let engine = frictionless_trend_engine();

        let output = engine.simulate(&sma_trend(), &frame).unwrap();
        let points = output.series.points();

        assert_eq!(output.missing_observations, 1);
        assert_eq!(points[120].portfolio_value, points[119].portfolio_value);
        assert_eq!(points[120].open_position_count, 1);

        // The gap is recovered on the next observation
        let expected = 10_000.0 * price(days - 1) / price(89);
        let final_value = output.series.last().unwrap().portfolio_value;
        assert!((final_value - expected).abs() < 1e-6 * expected);
    }

    #[test]
    fn test_no_candidates_keeps_waiting() {
        // Nothing ever trades above its SMA
        let mut obs = Vec::new();
        for i in 0..120 {
            obs.push(PriceObservation::new("FLAT", date(i), 1.0, 1e7, 1_000.0));
        }
        let output = frictionless_trend_engine()
            .simulate(&sma_trend(), &frame(obs))
            .unwrap();

        assert!(output.rebalances.is_empty());
        assert!(output
            .series
            .points()
            .iter()
            .all(|p| p.portfolio_value == 10_000.0 && p.open_position_count == 0));
    }

    #[test]
    fn test_warmup_trims_series() {
        let days = 250;
        let frame = frame(trend_panel(days, linear(days)));
        let profile = StrategyProfile {
            costs: CostModel::zero(),
            ..StrategyProfile::reversion_momentum()
        };
        let engine = BacktestEngine::new(BacktestConfig::new(profile));
        let strategy = StrategyRegistry::new()
            .create_default("reversion_momentum")
            .unwrap();

        let output = engine.simulate(strategy.as_ref(), &frame).unwrap();
        assert_eq!(output.series.len(), days - 200);
        assert_eq!(output.series.first().unwrap().date, date(200));
    }

    #[test]
    fn test_deterministic_replay() {
        let days = 200;
        let mut obs = trend_panel(days, linear(days));
        for i in 0..days {
            let wave = 5.0 + (i as f64 * 0.3).sin() + i as f64 * 0.01;
            obs.push(PriceObservation::new("WAVE", date(i), wave, 2e7, 500.0));
        }
        let frame = frame(obs);
        let profile = StrategyProfile {
            top_k: 2,
            ..StrategyProfile::sma_trend()
        };
        let engine = BacktestEngine::new(BacktestConfig::new(profile));

        let first = engine.run(&sma_trend(), &frame).unwrap();
        let second = engine.run(&sma_trend(), &frame).unwrap();
        assert_eq!(first.series, second.series);
        assert_eq!(first.metrics, second.metrics);
        assert_eq!(first.rebalances, second.rebalances);
    }

    #[test]
    fn test_empty_panel() {
        let engine = frictionless_trend_engine();
        let panel = PricePanel::default();

        let frame = IndicatorEngine::default().compute(&panel);
        let output = engine.simulate(&sma_trend(), &frame).unwrap();
        assert!(output.series.is_empty());

        let result = engine.run_panel(&sma_trend(), &panel);
        assert!(matches!(result, Err(BacktestError::InsufficientData(_))));
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let frame = frame(trend_panel(10, linear(10)));

        let mut config = BacktestConfig::new(StrategyProfile::sma_trend());
        config.rebalance_days = 0;
        let result = BacktestEngine::new(config).simulate(&sma_trend(), &frame);
        assert!(matches!(result, Err(BacktestError::Configuration(_))));

        let mut config = BacktestConfig::new(StrategyProfile::sma_trend());
        config.initial_capital = dec!(-5);
        let result = BacktestEngine::new(config).simulate(&sma_trend(), &frame);
        assert!(matches!(result, Err(BacktestError::Configuration(_))));

        let config = BacktestConfig::new(StrategyProfile {
            top_k: 0,
            ..StrategyProfile::sma_trend()
        });
        let result = BacktestEngine::new(config).simulate(&sma_trend(), &frame);
        assert!(matches!(result, Err(BacktestError::Configuration(_))));
    }

    #[test]
    fn test_unknown_indicator_window() {
        let frame = frame(trend_panel(10, linear(10)));
        let strategy = SmaTrendStrategy::new(SmaTrendConfig {
            sma_window: 100,
            ..SmaTrendConfig::default()
        });
        let engine = frictionless_trend_engine();
        assert!(matches!(
            engine.simulate(&strategy, &frame),
            Err(BacktestError::Strategy(_))
        ));
    }
}
