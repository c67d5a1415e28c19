//! Price observations and the price panel.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::DataError;

/// A single daily observation for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Asset identifier (token contract address or ticker)
    pub asset: String,
    /// Observation date
    pub date: NaiveDate,
    /// Price in quote currency
    pub price: f64,
    /// Market capitalization
    pub market_cap: f64,
    /// Trading volume
    pub volume: f64,
}

impl PriceObservation {
    /// Create a new observation.
    pub fn new(
        asset: impl Into<String>,
        date: NaiveDate,
        price: f64,
        market_cap: f64,
        volume: f64,
    ) -> Self {
        Self {
            asset: asset.into(),
            date,
            price,
            market_cap,
            volume,
        }
    }
}

/// Immutable snapshot of all observations, keyed by (asset, date).
///
/// Each asset's observations are kept in ascending date order. When the same
/// (asset, date) pair is ingested twice the later record wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricePanel {
    assets: BTreeMap<String, Vec<PriceObservation>>,
}

impl PricePanel {
    /// Build a panel from raw observations.
    ///
    /// Rejects observations whose price is not strictly positive.
    pub fn from_observations(
        observations: impl IntoIterator<Item = PriceObservation>,
    ) -> Result<Self, DataError> {
        let mut keyed: BTreeMap<String, BTreeMap<NaiveDate, PriceObservation>> = BTreeMap::new();

        for obs in observations {
            if obs.price <= 0.0 || !obs.price.is_finite() {
                return Err(DataError::NonPositivePrice {
                    asset: obs.asset,
                    date: obs.date,
                    price: obs.price,
                });
            }
            keyed
                .entry(obs.asset.clone())
                .or_default()
                .insert(obs.date, obs);
        }

        let assets = keyed
            .into_iter()
            .map(|(asset, by_date)| (asset, by_date.into_values().collect()))
            .collect();

        Ok(Self { assets })
    }

    /// Number of assets in the panel.
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Total number of observations.
    pub fn len(&self) -> usize {
        self.assets.values().map(Vec::len).sum()
    }

    /// Check if the panel holds no observations.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Asset identifiers in ascending order.
    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    /// Observations for one asset, ascending by date.
    pub fn series(&self, asset: &str) -> Option<&[PriceObservation]> {
        self.assets.get(asset).map(Vec::as_slice)
    }

    /// Iterate over (asset, observations) pairs in asset order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PriceObservation])> {
        self.assets
            .iter()
            .map(|(asset, series)| (asset.as_str(), series.as_slice()))
    }

    /// Sorted distinct dates across all assets.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.assets
            .values()
            .flat_map(|series| series.iter().map(|obs| obs.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// A copy of the panel with every observation after `cutoff` removed.
    pub fn truncated(&self, cutoff: NaiveDate) -> Self {
        let assets = self
            .assets
            .iter()
            .filter_map(|(asset, series)| {
                let end = series.partition_point(|obs| obs.date <= cutoff);
                (end > 0).then(|| (asset.clone(), series[..end].to_vec()))
            })
            .collect();
        Self { assets }
    }
}
