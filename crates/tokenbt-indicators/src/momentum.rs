//! Momentum and participation indicators.

use tokenbt_core::traits::Indicator;

use crate::moving_average::Sma;

/// Relative Strength Index (RSI).
///
/// Uses simple rolling means of gains and losses over `period` price
/// changes. A window with no losses reads 100 when there were gains and
/// 50 when the price did not move at all.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// Create a new RSI indicator.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    fn from_averages(gain: f64, loss: f64) -> f64 {
        if loss == 0.0 {
            if gain == 0.0 {
                50.0
            } else {
                100.0
            }
        } else {
            100.0 - (100.0 / (1.0 + gain / loss))
        }
    }
}

impl Indicator for Rsi {
    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; data.len()];
        if data.len() <= self.period {
            return result;
        }

        // Calculate price changes
        let mut gains = Vec::with_capacity(data.len() - 1);
        let mut losses = Vec::with_capacity(data.len() - 1);

        for i in 1..data.len() {
            let change = data[i] - data[i - 1];
            if change > 0.0 {
                gains.push(change);
                losses.push(0.0);
            } else {
                gains.push(0.0);
                losses.push(-change);
            }
        }

        let period_f64 = self.period as f64;
        for (i, (g, l)) in gains
            .windows(self.period)
            .zip(losses.windows(self.period))
            .enumerate()
        {
            let avg_gain = g.iter().sum::<f64>() / period_f64;
            let avg_loss = l.iter().sum::<f64>() / period_f64;
            result[i + self.period] = Some(Self::from_averages(avg_gain, avg_loss));
        }

        result
    }

    fn period(&self) -> usize {
        self.period + 1 // Need period+1 data points
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

/// Percentage price change over a trailing horizon.
#[derive(Debug, Clone)]
pub struct Momentum {
    period: usize,
}

impl Momentum {
    /// Create a momentum indicator over `period` observations.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Momentum {
    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; data.len()];
        for i in self.period..data.len() {
            let base = data[i - self.period];
            if base != 0.0 {
                result[i] = Some(data[i] / base - 1.0);
            }
        }
        result
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "Momentum"
    }
}

/// Volume divided by its trailing moving average.
#[derive(Debug, Clone)]
pub struct VolumeRatio {
    average: Sma,
}

impl VolumeRatio {
    /// Create a volume ratio against a `period`-day average.
    pub fn new(period: usize) -> Self {
        Self {
            average: Sma::new(period),
        }
    }
}

impl Indicator for VolumeRatio {
    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        self.average
            .calculate(data)
            .into_iter()
            .zip(data)
            .map(|(avg, &volume)| match avg {
                Some(avg) if avg > 0.0 => Some(volume / avg),
                _ => None,
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.average.period()
    }

    fn name(&self) -> &str {
        "Volume Ratio"
    }
}
