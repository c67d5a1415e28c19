//! Technical indicators and the indicator frame builder.
//!
//! This crate provides rolling-window indicators aligned with their input:
//! - Moving averages (SMA)
//! - Momentum indicators (RSI, momentum, volume ratio)
//! - Volatility indicators (standard deviation, Bollinger Bands, realized volatility)
//!
//! Every output value depends only on data at or before its index, and is
//! missing until a full window is available.

pub mod engine;
pub mod momentum;
pub mod moving_average;
pub mod volatility;

pub use engine::IndicatorEngine;
pub use momentum::{Momentum, Rsi, VolumeRatio};
pub use moving_average::Sma;
pub use volatility::{BollingerBands, BollingerOutput, RealizedVolatility, RollingStdDev};
