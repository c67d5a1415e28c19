//! Backtest report generation.

use serde::{Deserialize, Serialize};
use tokenbt_core::types::PortfolioValueSeries;

use crate::engine::{ExitRecord, RebalanceRecord};
use crate::{BacktestConfig, PerformanceMetrics};

/// Complete backtest report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Strategy name
    pub strategy: String,
    /// Configuration used
    pub config: BacktestConfig,
    /// Performance metrics
    pub metrics: PerformanceMetrics,
    /// Daily portfolio values
    pub series: PortfolioValueSeries,
    pub rebalances: Vec<RebalanceRecord>,
    pub exits: Vec<ExitRecord>,
    /// Held-position days with no observation
    pub missing_observations: usize,
}

impl BacktestReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let m = &self.metrics;
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str(&format!("  Strategy:            {}\n\n", self.strategy));

        s.push_str("PERFORMANCE\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Initial Capital:     ${:.2}\n", m.initial_capital));
        s.push_str(&format!("  Final Value:         ${:.2}\n", m.final_value));
        s.push_str(&format!(
            "  Total Return:        {:.2}%\n",
            m.total_return * 100.0
        ));
        s.push_str(&format!(
            "  Annualized Return:   {:.2}%\n",
            m.annualized_return * 100.0
        ));
        s.push('\n');

        s.push_str("RISK METRICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Volatility:          {:.2}%\n",
            m.annualized_volatility * 100.0
        ));
        s.push_str(&format!("  Sharpe Ratio:        {:.2}\n", m.sharpe_ratio));
        s.push_str(&format!("  Calmar Ratio:        {:.2}\n", m.calmar_ratio));
        s.push_str(&format!(
            "  Max Drawdown:        {:.2}%\n",
            m.max_drawdown * 100.0
        ));
        s.push_str(&format!("  Win Rate:            {:.2}%\n", m.win_rate * 100.0));
        s.push('\n');

        s.push_str("ACTIVITY\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Backtest Days:       {}\n", m.n_days));
        s.push_str(&format!("  Avg Positions Held:  {:.2}\n", m.average_positions));
        s.push_str(&format!("  Rebalances:          {}\n", self.rebalances.len()));
        s.push_str(&format!("  Early Exits:         {}\n", self.exits.len()));
        s.push_str(&format!(
            "  Missing Marks:       {}\n",
            self.missing_observations
        ));
        s.push('\n');

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export the value series to CSV.
    pub fn series_to_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for point in self.series.points() {
            writer.serialize(point)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn report() -> BacktestReport {
        let mut series = PortfolioValueSeries::new();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        series.push(start, 10_000.0, 0);
        series.push(start.succ_opt().unwrap(), 11_000.0, 2);

        BacktestReport {
            strategy: "sma_trend".into(),
            config: BacktestConfig::default(),
            metrics: PerformanceMetrics::compute(&series, 10_000.0).unwrap(),
            series,
            rebalances: Vec::new(),
            exits: Vec::new(),
            missing_observations: 0,
        }
    }

    #[test]
    fn test_report_summary() {
        let summary = report().summary();
        assert!(summary.contains("Total Return"));
        assert!(summary.contains("10.00%"));
        assert!(summary.contains("sma_trend"));
    }

    #[test]
    fn test_series_csv() {
        let csv = report().series_to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,portfolio_value,open_position_count");
        assert_eq!(lines[1], "2024-01-01,10000.0,0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_json_roundtrip_fields() {
        let json = report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["strategy"], "sma_trend");
        assert_eq!(value["series"].as_array().unwrap().len(), 2);
        assert!(value["metrics"]["sharpe_ratio"].is_number());
    }
}
