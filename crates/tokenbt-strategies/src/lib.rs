//! Strategy variants for the token backtester.
//!
//! This crate provides the closed set of rotation strategies:
//! - Reversion-momentum (canonical and relaxed thresholds)
//! - SMA trend following
//!
//! plus the quality score used to rank candidates and the per-variant
//! simulator policy.

mod profile;
mod registry;
mod reversion_momentum;
mod scoring;
mod sma_trend;

pub use profile::StrategyProfile;
pub use registry::{merge_json, StrategyInfo, StrategyKind, StrategyRegistry};
pub use reversion_momentum::{ReversionMomentumConfig, ReversionMomentumStrategy};
pub use scoring::{QualityWeights, ScoreInput};
pub use sma_trend::{SmaTrendConfig, SmaTrendStrategy};
