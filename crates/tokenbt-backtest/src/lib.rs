//! Backtest simulator and performance analysis.

mod engine;
mod report;
mod statistics;

pub use engine::{BacktestConfig, BacktestEngine, ExitRecord, RebalanceRecord, SimulationOutput};
pub use report::BacktestReport;
pub use statistics::{max_drawdown, PerformanceMetrics, PERIODS_PER_YEAR};
