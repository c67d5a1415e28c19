//! Logging setup for the backtester.

mod logging;

pub use logging::{build_filter, setup_logging, LogFormat};
