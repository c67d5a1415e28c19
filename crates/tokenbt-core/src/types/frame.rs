//! Indicator frame: the price panel extended with per-asset derived columns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::IndicatorError;

/// Windows computed into an [`IndicatorFrame`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSettings {
    /// Simple moving average windows
    pub sma_windows: Vec<usize>,
    /// Bollinger Bands window
    pub bollinger_window: usize,
    /// Bollinger Bands standard deviation multiplier
    pub bollinger_k: f64,
    /// RSI window (number of price changes)
    pub rsi_window: usize,
    /// Momentum horizons in observations
    pub momentum_windows: Vec<usize>,
    /// Volume moving average window for the volume ratio
    pub volume_window: usize,
    /// Realized volatility window (number of daily returns)
    pub volatility_window: usize,
    /// Annualization factor applied as sqrt(periods_per_year)
    pub periods_per_year: f64,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        let mut sma_windows: Vec<usize> = (5..=30).collect();
        sma_windows.extend([50, 200]);
        Self {
            sma_windows,
            bollinger_window: 20,
            bollinger_k: 2.0,
            rsi_window: 14,
            momentum_windows: vec![7, 30],
            volume_window: 20,
            volatility_window: 30,
            periods_per_year: 365.0,
        }
    }
}

impl IndicatorSettings {
    /// Validate window lengths.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.sma_windows.iter().any(|&w| w == 0) {
            return Err(IndicatorError::InvalidParameter(
                "SMA windows must be greater than 0".into(),
            ));
        }
        if self.momentum_windows.iter().any(|&w| w == 0) {
            return Err(IndicatorError::InvalidParameter(
                "Momentum windows must be greater than 0".into(),
            ));
        }
        if self.bollinger_window < 2 || self.volatility_window < 2 {
            return Err(IndicatorError::InvalidParameter(
                "Bollinger and volatility windows must be at least 2".into(),
            ));
        }
        if self.rsi_window == 0 || self.volume_window == 0 {
            return Err(IndicatorError::InvalidParameter(
                "RSI and volume windows must be greater than 0".into(),
            ));
        }
        if self.bollinger_k <= 0.0 || self.periods_per_year <= 0.0 {
            return Err(IndicatorError::InvalidParameter(
                "Bollinger multiplier and periods per year must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Check whether an SMA window is computed.
    pub fn has_sma(&self, window: usize) -> bool {
        self.sma_windows.contains(&window)
    }

    /// Check whether a momentum horizon is computed.
    pub fn has_momentum(&self, window: usize) -> bool {
        self.momentum_windows.contains(&window)
    }
}

/// Observation plus derived indicator values for one (asset, date).
///
/// Every value depends only on observations at or before `date` for the same
/// asset. `None` means the trailing window was not yet full or the value is
/// undefined (e.g. zero band width).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub price: f64,
    pub market_cap: f64,
    pub volume: f64,
    /// Percentage change from the previous observation
    pub daily_return: Option<f64>,
    /// Defined SMA values keyed by window
    pub sma: BTreeMap<usize, f64>,
    pub bb_middle: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    /// (price - lower) / (upper - lower)
    pub bb_position: Option<f64>,
    pub rsi: Option<f64>,
    /// Defined momentum values keyed by horizon
    pub momentum: BTreeMap<usize, f64>,
    pub volume_ratio: Option<f64>,
    /// Annualized realized volatility
    pub volatility: Option<f64>,
}

impl IndicatorRow {
    /// Row holding only the raw observation, with every indicator missing.
    pub fn bare(date: NaiveDate, price: f64, market_cap: f64, volume: f64) -> Self {
        Self {
            date,
            price,
            market_cap,
            volume,
            daily_return: None,
            sma: BTreeMap::new(),
            bb_middle: None,
            bb_upper: None,
            bb_lower: None,
            bb_position: None,
            rsi: None,
            momentum: BTreeMap::new(),
            volume_ratio: None,
            volatility: None,
        }
    }

    /// SMA for a window, if defined.
    #[inline]
    pub fn sma(&self, window: usize) -> Option<f64> {
        self.sma.get(&window).copied()
    }

    /// Momentum for a horizon, if defined.
    #[inline]
    pub fn momentum(&self, window: usize) -> Option<f64> {
        self.momentum.get(&window).copied()
    }
}

/// Indicator rows for a single asset, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetFrame {
    pub asset: String,
    rows: Vec<IndicatorRow>,
}

impl AssetFrame {
    /// Create a frame from rows already sorted by date.
    pub fn new(asset: impl Into<String>, rows: Vec<IndicatorRow>) -> Self {
        Self {
            asset: asset.into(),
            rows,
        }
    }

    /// All rows.
    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the frame is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with date <= cutoff.
    pub fn history(&self, cutoff: NaiveDate) -> &[IndicatorRow] {
        let end = self.rows.partition_point(|row| row.date <= cutoff);
        &self.rows[..end]
    }

    /// Latest row with date <= `date`.
    pub fn as_of(&self, date: NaiveDate) -> Option<&IndicatorRow> {
        self.history(date).last()
    }

    /// Row observed exactly on `date`.
    pub fn on(&self, date: NaiveDate) -> Option<&IndicatorRow> {
        self.rows
            .binary_search_by_key(&date, |row| row.date)
            .ok()
            .map(|idx| &self.rows[idx])
    }
}

/// Indicator frames for every asset in a panel.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    settings: IndicatorSettings,
    assets: BTreeMap<String, AssetFrame>,
    dates: Vec<NaiveDate>,
}

impl IndicatorFrame {
    /// Assemble a frame from per-asset frames.
    pub fn new(settings: IndicatorSettings, frames: impl IntoIterator<Item = AssetFrame>) -> Self {
        let assets: BTreeMap<String, AssetFrame> = frames
            .into_iter()
            .map(|frame| (frame.asset.clone(), frame))
            .collect();
        let dates = assets
            .values()
            .flat_map(|frame| frame.rows.iter().map(|row| row.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self {
            settings,
            assets,
            dates,
        }
    }

    /// Settings the frame was computed with.
    pub fn settings(&self) -> &IndicatorSettings {
        &self.settings
    }

    /// Sorted distinct dates across all assets.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Check if the frame holds no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of assets.
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Frame for one asset.
    pub fn asset(&self, asset: &str) -> Option<&AssetFrame> {
        self.assets.get(asset)
    }

    /// Iterate over asset frames in asset order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetFrame> {
        self.assets.values()
    }

    /// Row for (asset, date), if the asset was observed on that date.
    pub fn row_on(&self, asset: &str, date: NaiveDate) -> Option<&IndicatorRow> {
        self.assets.get(asset)?.on(date)
    }
}
