//! Performance statistics.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tokenbt_core::types::PortfolioValueSeries;
use tokenbt_core::BacktestError;

/// Calendar days per year; crypto trades every day.
pub const PERIODS_PER_YEAR: f64 = 365.0;

/// Performance metrics of a completed backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Initial capital
    pub initial_capital: f64,
    /// Final portfolio value
    pub final_value: f64,
    /// final / initial - 1
    pub total_return: f64,
    /// (final / initial)^(365 / n_days) - 1, or 0 for a single point
    pub annualized_return: f64,
    /// Sample standard deviation of daily returns times sqrt(365)
    pub annualized_volatility: f64,
    /// Annualized return over annualized volatility
    pub sharpe_ratio: f64,
    /// Worst peak-to-trough decline, in [-1, 0]
    pub max_drawdown: f64,
    /// Annualized return over |max drawdown|
    pub calmar_ratio: f64,
    /// Share of daily returns that are strictly positive
    pub win_rate: f64,
    /// Number of points in the series
    pub n_days: usize,
    /// Mean number of open positions per day
    pub average_positions: f64,
}

impl PerformanceMetrics {
    /// Compute metrics from a value series.
    pub fn compute(
        series: &PortfolioValueSeries,
        initial_capital: f64,
    ) -> Result<Self, BacktestError> {
        let Some(last) = series.last() else {
            return Err(BacktestError::InsufficientData(
                "Portfolio value series is empty".into(),
            ));
        };
        if initial_capital <= 0.0 {
            return Err(BacktestError::Configuration(
                "Initial capital must be positive".into(),
            ));
        }

        let n_days = series.len();
        let final_value = last.portfolio_value;
        let growth = final_value / initial_capital;
        let total_return = growth - 1.0;
        // One point spans no elapsed time
        let annualized_return = if n_days > 1 {
            growth.powf(PERIODS_PER_YEAR / n_days as f64) - 1.0
        } else {
            0.0
        };

        let returns: Vec<f64> = series.daily_returns().into_iter().flatten().collect();
        let annualized_volatility = if returns.len() < 2 {
            0.0
        } else {
            returns.iter().std_dev() * PERIODS_PER_YEAR.sqrt()
        };
        let sharpe_ratio = if annualized_volatility > 0.0 {
            annualized_return / annualized_volatility
        } else {
            0.0
        };

        let max_drawdown = max_drawdown(&series.values());
        let calmar_ratio = if max_drawdown != 0.0 {
            annualized_return / max_drawdown.abs()
        } else {
            0.0
        };

        let win_rate = if returns.is_empty() {
            0.0
        } else {
            returns.iter().filter(|&&r| r > 0.0).count() as f64 / returns.len() as f64
        };

        let average_positions = series
            .points()
            .iter()
            .map(|p| p.open_position_count as f64)
            .sum::<f64>()
            / n_days as f64;

        Ok(Self {
            initial_capital,
            final_value,
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown,
            calmar_ratio,
            win_rate,
            n_days,
            average_positions,
        })
    }
}

/// Most negative (value - running peak) / running peak.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;
    for &value in values {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.min((value - peak) / peak);
        }
    }
    worst.max(-1.0)
}
