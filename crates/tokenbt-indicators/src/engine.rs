//! Builds the indicator frame from a price panel.

use rayon::prelude::*;
use tracing::info;

use tokenbt_core::traits::{Indicator, MultiOutputIndicator};
use tokenbt_core::{
    AssetFrame, IndicatorError, IndicatorFrame, IndicatorRow, IndicatorSettings, PriceObservation,
    PricePanel,
};

use crate::momentum::{Momentum, Rsi, VolumeRatio};
use crate::moving_average::Sma;
use crate::volatility::{BollingerBands, RealizedVolatility};

/// Computes every configured indicator for each asset in a panel.
///
/// Assets are processed independently and in parallel; the resulting
/// frame is ordered by asset identifier regardless of scheduling.
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    settings: IndicatorSettings,
}

impl IndicatorEngine {
    /// Create an engine, validating the window settings.
    pub fn new(settings: IndicatorSettings) -> Result<Self, IndicatorError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &IndicatorSettings {
        &self.settings
    }

    /// Compute the indicator frame for every asset in the panel.
    pub fn compute(&self, panel: &PricePanel) -> IndicatorFrame {
        let series: Vec<(&str, &[PriceObservation])> = panel.iter().collect();
        let frames: Vec<AssetFrame> = series
            .par_iter()
            .map(|(asset, observations)| self.compute_asset(asset, observations))
            .collect();

        let frame = IndicatorFrame::new(self.settings.clone(), frames);
        info!(
            assets = frame.asset_count(),
            rows = panel.len(),
            dates = frame.dates().len(),
            "Computed indicator frame"
        );
        frame
    }

    /// Compute indicator rows for one asset's ascending observations.
    pub fn compute_asset(&self, asset: &str, observations: &[PriceObservation]) -> AssetFrame {
        let s = &self.settings;
        let prices: Vec<f64> = observations.iter().map(|o| o.price).collect();
        let volumes: Vec<f64> = observations.iter().map(|o| o.volume).collect();

        let smas: Vec<(usize, Vec<Option<f64>>)> = s
            .sma_windows
            .iter()
            .map(|&w| (w, Sma::new(w).calculate(&prices)))
            .collect();
        let momentum: Vec<(usize, Vec<Option<f64>>)> = s
            .momentum_windows
            .iter()
            .map(|&w| (w, Momentum::new(w).calculate(&prices)))
            .collect();
        let bands = BollingerBands::with_params(s.bollinger_window, s.bollinger_k).calculate(&prices);
        let rsi = Rsi::new(s.rsi_window).calculate(&prices);
        let volume_ratio = VolumeRatio::new(s.volume_window).calculate(&volumes);
        let volatility =
            RealizedVolatility::new(s.volatility_window, s.periods_per_year).calculate(&prices);

        let rows = observations
            .iter()
            .enumerate()
            .map(|(i, obs)| {
                let mut row = IndicatorRow::bare(obs.date, obs.price, obs.market_cap, obs.volume);
                if i > 0 {
                    row.daily_return = Some(prices[i] / prices[i - 1] - 1.0);
                }
                for (window, values) in &smas {
                    if let Some(v) = values[i] {
                        row.sma.insert(*window, v);
                    }
                }
                for (window, values) in &momentum {
                    if let Some(v) = values[i] {
                        row.momentum.insert(*window, v);
                    }
                }
                if let Some(band) = bands[i] {
                    row.bb_middle = Some(band.middle);
                    row.bb_upper = Some(band.upper);
                    row.bb_lower = Some(band.lower);
                    row.bb_position = band.position;
                }
                row.rsi = rsi[i];
                row.volume_ratio = volume_ratio[i];
                row.volatility = volatility[i];
                row
            })
            .collect();

        AssetFrame::new(asset, rows)
    }
}
