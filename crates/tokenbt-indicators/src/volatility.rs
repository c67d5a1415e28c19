//! Volatility indicators.

use serde::{Deserialize, Serialize};
use tokenbt_core::traits::{Indicator, MultiOutputIndicator};

fn sample_std_dev(window: &[f64]) -> f64 {
    let n = window.len() as f64;
    let mean: f64 = window.iter().sum::<f64>() / n;
    let variance: f64 = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Rolling sample standard deviation (n - 1 denominator).
#[derive(Debug, Clone)]
pub struct RollingStdDev {
    period: usize,
}

impl RollingStdDev {
    /// Create a new standard deviation indicator.
    pub fn new(period: usize) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        Self { period }
    }
}

impl Indicator for RollingStdDev {
    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; data.len()];
        for (i, window) in data.windows(self.period).enumerate() {
            result[i + self.period - 1] = Some(sample_std_dev(window));
        }
        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "StdDev"
    }
}

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerOutput {
    /// Upper band
    pub upper: f64,
    /// Middle band (SMA)
    pub middle: f64,
    /// Lower band
    pub lower: f64,
    /// (price - lower) / (upper - lower), missing when the bands coincide
    pub position: Option<f64>,
}

/// Bollinger Bands.
///
/// Consists of a middle band (SMA) with upper and lower bands
/// at a specified number of sample standard deviations.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    /// Create new Bollinger Bands with default parameters (20, 2.0).
    pub fn new() -> Self {
        Self::with_params(20, 2.0)
    }

    /// Create Bollinger Bands with custom parameters.
    pub fn with_params(period: usize, std_dev_multiplier: f64) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        assert!(
            std_dev_multiplier > 0.0,
            "Std dev multiplier must be positive"
        );
        Self {
            period,
            std_dev_multiplier,
        }
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for BollingerBands {
    type Outputs = BollingerOutput;

    fn calculate(&self, data: &[f64]) -> Vec<Option<BollingerOutput>> {
        let mut result = vec![None; data.len()];
        let period_f64 = self.period as f64;

        for (i, window) in data.windows(self.period).enumerate() {
            let idx = i + self.period - 1;
            let mean: f64 = window.iter().sum::<f64>() / period_f64;
            let std_dev = sample_std_dev(window);

            let upper = mean + self.std_dev_multiplier * std_dev;
            let lower = mean - self.std_dev_multiplier * std_dev;
            let width = upper - lower;
            let position = (width > 0.0).then(|| (data[idx] - lower) / width);

            result[idx] = Some(BollingerOutput {
                upper,
                middle: mean,
                lower,
                position,
            });
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "Bollinger Bands"
    }
}

/// Annualized realized volatility of daily returns.
///
/// Takes prices, derives simple returns and reports the sample standard
/// deviation of the trailing `period` returns scaled by sqrt(periods per year).
#[derive(Debug, Clone)]
pub struct RealizedVolatility {
    period: usize,
    annualization: f64,
}

impl RealizedVolatility {
    /// Create a volatility indicator annualized with `periods_per_year`.
    pub fn new(period: usize, periods_per_year: f64) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        assert!(periods_per_year > 0.0, "Periods per year must be positive");
        Self {
            period,
            annualization: periods_per_year.sqrt(),
        }
    }
}

impl Indicator for RealizedVolatility {
    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; data.len()];
        if data.len() < 2 {
            return result;
        }

        let returns: Vec<f64> = data.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
        for (i, window) in returns.windows(self.period).enumerate() {
            // returns[j] belongs to price index j + 1
            result[i + self.period] = Some(sample_std_dev(window) * self.annualization);
        }
        result
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "Volatility"
    }
}
