//! Core data types for the backtester.

mod frame;
mod observation;
mod policy;
mod position;
mod series;

pub use frame::{AssetFrame, IndicatorFrame, IndicatorRow, IndicatorSettings};
pub use observation::{PriceObservation, PricePanel};
pub use policy::{ExitCostPolicy, ExitReason, Weighting};
pub use position::{PortfolioState, Position};
pub use series::{PortfolioValuePoint, PortfolioValueSeries};
