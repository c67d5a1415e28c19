//! Point-in-time universe selection.
//!
//! Eligibility on a cutoff date is decided from rows dated at or before the
//! cutoff only, so adding later observations never changes the answer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use tokenbt_core::{AssetFrame, BacktestError, IndicatorFrame, IndicatorRow};
use tracing::debug;

/// Arbitrum stablecoin contracts excluded from trading by default.
pub const ARBITRUM_STABLECOINS: &[(&str, &str)] = &[
    ("0xaf88d065e77c8cc2239327c5edb3a432268e5831", "USDC"),
    ("0xff970a61a04b1ca14834a43f5de4533ebddb5cc8", "USDC.e"),
    ("0xfd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9", "USDT"),
    ("0xda10009cbd5d07dd0cecc66161fc93d7c9000da1", "DAI"),
    ("0x17fc002b466eec40dae837fc4be5c67993ddbd6f", "FRAX"),
    ("0x93b346b6bc2548da6a1e7d98e9a421b42541425b", "LUSD"),
    ("0xfea7a6a0b346362bf88a9e4a88416b77a57d6c2a", "MIM"),
];

/// Span of history checked by the extreme-return guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnWindow {
    /// Every row up to the cutoff
    FullHistory,
    /// The trailing `days` rows up to the cutoff. Counts observations, so a
    /// series with gaps spans more than `days` calendar days.
    Trailing { days: usize },
}

/// Rejection thresholds for the tradable universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniversePolicy {
    /// Minimum number of observations up to the cutoff
    pub min_observations: usize,
    /// Minimum latest market capitalization
    pub min_market_cap: f64,
    /// Trailing rows inspected for zero-volume days. Counts observations,
    /// not calendar days, so gaps in the data reach further back in time.
    pub zero_volume_window: usize,
    /// Maximum share of zero-volume days in that window
    pub max_zero_volume_fraction: f64,
    /// Maximum absolute daily return tolerated
    pub max_abs_daily_return: f64,
    pub return_window: ReturnWindow,
    /// Asset identifiers never eligible (compared case-insensitively)
    pub excluded_assets: BTreeSet<String>,
}

impl Default for UniversePolicy {
    fn default() -> Self {
        Self {
            min_observations: 730,
            min_market_cap: 5_000_000.0,
            zero_volume_window: 30,
            max_zero_volume_fraction: 0.1,
            max_abs_daily_return: 2.0,
            return_window: ReturnWindow::FullHistory,
            excluded_assets: ARBITRUM_STABLECOINS
                .iter()
                .map(|(address, _)| address.to_string())
                .collect(),
        }
    }
}

impl UniversePolicy {
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.zero_volume_window == 0 {
            return Err(BacktestError::Configuration(
                "Zero-volume window must be greater than 0".into(),
            ));
        }
        if let ReturnWindow::Trailing { days: 0 } = self.return_window {
            return Err(BacktestError::Configuration(
                "Trailing return window must be greater than 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.max_zero_volume_fraction) {
            return Err(BacktestError::Configuration(
                "Zero-volume fraction must be within [0, 1]".into(),
            ));
        }
        if self.min_market_cap < 0.0 || self.max_abs_daily_return <= 0.0 {
            return Err(BacktestError::Configuration(
                "Market cap floor must be non-negative and return ceiling positive".into(),
            ));
        }
        Ok(())
    }

    fn is_excluded(&self, asset: &str) -> bool {
        self.excluded_assets
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(asset))
    }
}

/// Why an asset is not tradable on a given date.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Excluded,
    InsufficientHistory { required: usize, available: usize },
    MarketCap { latest: f64, minimum: f64 },
    Illiquid { zero_volume_days: usize, window: usize },
    ExtremeReturn { max_abs_return: f64, ceiling: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Excluded => write!(f, "excluded asset"),
            Rejection::InsufficientHistory {
                required,
                available,
            } => write!(f, "insufficient history: {available} of {required} observations"),
            Rejection::MarketCap { latest, minimum } => {
                write!(f, "market cap {latest:.0} below {minimum:.0}")
            }
            Rejection::Illiquid {
                zero_volume_days,
                window,
            } => write!(f, "{zero_volume_days} zero-volume days in last {window}"),
            Rejection::ExtremeReturn {
                max_abs_return,
                ceiling,
            } => write!(f, "daily return {max_abs_return:.2} above {ceiling:.2}"),
        }
    }
}

/// Applies a [`UniversePolicy`] to an indicator frame.
#[derive(Debug, Clone, Default)]
pub struct UniverseFilter {
    policy: UniversePolicy,
}

impl UniverseFilter {
    pub fn new(policy: UniversePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &UniversePolicy {
        &self.policy
    }

    /// Decide whether one asset is tradable as of `cutoff`.
    pub fn evaluate(&self, frame: &AssetFrame, cutoff: NaiveDate) -> Result<(), Rejection> {
        let policy = &self.policy;
        if policy.is_excluded(&frame.asset) {
            return Err(Rejection::Excluded);
        }

        let history = frame.history(cutoff);
        if history.len() < policy.min_observations || history.is_empty() {
            return Err(Rejection::InsufficientHistory {
                required: policy.min_observations.max(1),
                available: history.len(),
            });
        }

        let latest = &history[history.len() - 1];
        if latest.market_cap < policy.min_market_cap {
            return Err(Rejection::MarketCap {
                latest: latest.market_cap,
                minimum: policy.min_market_cap,
            });
        }

        let recent = trailing(history, policy.zero_volume_window);
        let zero_volume_days = recent.iter().filter(|row| row.volume == 0.0).count();
        if zero_volume_days as f64 > recent.len() as f64 * policy.max_zero_volume_fraction {
            return Err(Rejection::Illiquid {
                zero_volume_days,
                window: recent.len(),
            });
        }

        let span = match policy.return_window {
            ReturnWindow::FullHistory => history,
            ReturnWindow::Trailing { days } => trailing(history, days),
        };
        let max_abs_return = span
            .iter()
            .filter_map(|row| row.daily_return)
            .map(f64::abs)
            .fold(0.0, f64::max);
        if max_abs_return > policy.max_abs_daily_return {
            return Err(Rejection::ExtremeReturn {
                max_abs_return,
                ceiling: policy.max_abs_daily_return,
            });
        }

        Ok(())
    }

    /// Assets eligible for selection as of `cutoff`, in asset order.
    pub fn eligible(&self, frame: &IndicatorFrame, cutoff: NaiveDate) -> Vec<String> {
        frame
            .iter()
            .filter(|asset| match self.evaluate(asset, cutoff) {
                Ok(()) => true,
                Err(reason) => {
                    debug!(asset = %asset.asset, %cutoff, %reason, "Universe rejection");
                    false
                }
            })
            .map(|asset| asset.asset.clone())
            .collect()
    }
}

fn trailing(rows: &[IndicatorRow], n: usize) -> &[IndicatorRow] {
    &rows[rows.len().saturating_sub(n)..]
}
