//! Portfolio value series produced by the simulator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Portfolio value at the end of one simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValuePoint {
    pub date: NaiveDate,
    pub portfolio_value: f64,
    pub open_position_count: usize,
}

/// Append-only sequence of daily portfolio values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioValueSeries {
    points: Vec<PortfolioValuePoint>,
}

impl PortfolioValueSeries {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the value for a day.
    pub fn push(&mut self, date: NaiveDate, portfolio_value: f64, open_position_count: usize) {
        self.points.push(PortfolioValuePoint {
            date,
            portfolio_value,
            open_position_count,
        });
    }

    pub fn points(&self) -> &[PortfolioValuePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PortfolioValuePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PortfolioValuePoint> {
        self.points.last()
    }

    /// Portfolio values in date order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.portfolio_value).collect()
    }

    /// Day-over-day returns; the first entry is missing.
    pub fn daily_returns(&self) -> Vec<Option<f64>> {
        let mut returns = Vec::with_capacity(self.points.len());
        for (i, point) in self.points.iter().enumerate() {
            if i == 0 {
                returns.push(None);
                continue;
            }
            let prev = self.points[i - 1].portfolio_value;
            if prev != 0.0 {
                returns.push(Some(point.portfolio_value / prev - 1.0));
            } else {
                returns.push(None);
            }
        }
        returns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_returns() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut series = PortfolioValueSeries::new();
        series.push(d, 100.0, 0);
        series.push(d.succ_opt().unwrap(), 110.0, 1);
        series.push(d.succ_opt().unwrap().succ_opt().unwrap(), 99.0, 1);

        let returns = series.daily_returns();
        assert_eq!(returns.len(), 3);
        assert!(returns[0].is_none());
        assert!((returns[1].unwrap() - 0.1).abs() < 1e-10);
        assert!((returns[2].unwrap() + 0.1).abs() < 1e-10);
        assert_eq!(series.last().unwrap().open_position_count, 1);
    }

    #[test]
    fn test_series_serializes_as_list() {
        let mut series = PortfolioValueSeries::new();
        series.push(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 100.0, 0);
        let json = serde_json::to_value(&series).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["open_position_count"], 0);
    }
}
