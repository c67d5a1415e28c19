//! Position and portfolio state types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A long position in a single asset, opened at a rebalance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Asset identifier
    pub asset: String,
    /// Entry price including transaction costs
    pub entry_price: f64,
    /// Capital allocated at entry
    pub allocation: f64,
    /// Marked value, compounded daily from the allocation
    pub value: f64,
    /// Last observed price the position was marked at
    pub last_price: f64,
    /// Rebalance date the position was opened on
    pub entry_date: NaiveDate,
}

impl Position {
    /// Open a position. The marked value starts at the allocation.
    pub fn new(
        asset: impl Into<String>,
        entry_price: f64,
        allocation: f64,
        entry_date: NaiveDate,
    ) -> Self {
        Self {
            asset: asset.into(),
            entry_price,
            allocation,
            value: allocation,
            last_price: entry_price,
            entry_date,
        }
    }

    /// Set the raw price the first mark is measured from.
    pub fn with_last_price(mut self, price: f64) -> Self {
        self.last_price = price;
        self
    }

    /// Return since entry at the given price.
    pub fn total_return(&self, price: f64) -> f64 {
        if self.entry_price > 0.0 {
            price / self.entry_price - 1.0
        } else {
            0.0
        }
    }

    /// Mark the position to `price`, returning the return since the last mark.
    pub fn mark_to(&mut self, price: f64) -> f64 {
        let daily_return = if self.last_price > 0.0 {
            price / self.last_price - 1.0
        } else {
            0.0
        };
        self.value *= 1.0 + daily_return;
        self.last_price = price;
        daily_return
    }
}

/// Mutable state of the simulated portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    /// Portfolio value
    pub capital: f64,
    /// Held positions keyed by asset
    pub positions: BTreeMap<String, Position>,
    /// Day index of the last completed rebalance
    pub last_rebalance: Option<usize>,
}

impl PortfolioState {
    /// Fresh state holding only capital.
    pub fn new(capital: f64) -> Self {
        Self {
            capital,
            positions: BTreeMap::new(),
            last_rebalance: None,
        }
    }

    /// Number of open positions.
    pub fn open_positions(&self) -> usize {
        self.positions.len()
    }

    /// Check whether a rebalance is due on `day`.
    ///
    /// The first rebalance fires on the warm-up day; later ones once
    /// `interval` days have elapsed since the previous one.
    pub fn rebalance_due(&self, day: usize, warmup: usize, interval: usize) -> bool {
        if day < warmup {
            return false;
        }
        match self.last_rebalance {
            None => true,
            Some(last) => day - last >= interval,
        }
    }

    /// Replace every position with a new set.
    pub fn replace_positions(&mut self, positions: impl IntoIterator<Item = Position>, day: usize) {
        self.positions = positions
            .into_iter()
            .map(|pos| (pos.asset.clone(), pos))
            .collect();
        self.last_rebalance = Some(day);
    }
}
