//! Quality score used to rank rebalance candidates.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tokenbt_core::{Candidate, IndicatorRow};

/// Weights of the composite quality score.
///
/// `score = rsi * (anchor - RSI) / anchor
///        + volatility * (1 - vol / max_vol)
///        + volume * (volume_ratio / max_volume_ratio)`
///
/// Maxima are taken over the candidate set of one rebalance. Lower RSI,
/// lower volatility and higher relative volume all rank higher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub rsi: f64,
    pub volatility: f64,
    pub volume: f64,
    /// RSI level scoring zero on the RSI term
    pub rsi_anchor: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            rsi: 0.5,
            volatility: 0.3,
            volume: 0.2,
            rsi_anchor: 40.0,
        }
    }
}

/// Inputs of the quality score for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreInput {
    pub asset: String,
    pub rsi: f64,
    pub volatility: f64,
    pub volume_ratio: f64,
}

impl ScoreInput {
    /// Extract scoring inputs, or `None` if any is missing.
    pub fn from_row(asset: &str, row: &IndicatorRow) -> Option<Self> {
        Some(Self {
            asset: asset.to_string(),
            rsi: row.rsi?,
            volatility: row.volatility?,
            volume_ratio: row.volume_ratio?,
        })
    }
}

fn normalise(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}

impl QualityWeights {
    /// Score and rank candidates, best first. Ties go to the lower asset id.
    pub fn rank(&self, inputs: Vec<ScoreInput>) -> Vec<Candidate> {
        let max_vol = inputs.iter().map(|c| c.volatility).fold(0.0, f64::max);
        let max_volume = inputs.iter().map(|c| c.volume_ratio).fold(0.0, f64::max);

        let mut ranked: Vec<Candidate> = inputs
            .into_iter()
            .map(|c| {
                let score = self.rsi * (self.rsi_anchor - c.rsi) / self.rsi_anchor
                    + self.volatility * (1.0 - normalise(c.volatility, max_vol))
                    + self.volume * normalise(c.volume_ratio, max_volume);
                Candidate {
                    asset: c.asset,
                    score,
                }
            })
            .collect();

        ranked.sort_by(|a, b| match b.score.total_cmp(&a.score) {
            Ordering::Equal => a.asset.cmp(&b.asset),
            other => other,
        });
        ranked
    }
}
