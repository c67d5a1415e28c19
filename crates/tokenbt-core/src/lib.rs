//! Core types and traits for the token backtester.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (PriceObservation, PricePanel)
//! - The per-asset indicator frame shared by the universe filter, strategies and simulator
//! - Position, portfolio state and portfolio value series types
//! - Core traits for indicators, strategies and price sources

pub mod types;
pub mod traits;
pub mod error;

pub use error::{BacktestError, BacktestResult, DataError, IndicatorError, StrategyError};
pub use types::*;
pub use traits::*;
