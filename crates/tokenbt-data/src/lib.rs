//! Price panel sources for the backtester.

mod csv_source;

pub use csv_source::{parse_date, CsvPriceSource};

use std::path::Path;
use tokenbt_core::error::DataError;
use tokenbt_core::traits::PriceSource;
use tokenbt_core::types::PricePanel;

/// Load a price panel from a CSV file or a directory of CSV files.
pub async fn load_csv(path: impl AsRef<Path>) -> Result<PricePanel, DataError> {
    let source = CsvPriceSource::new(path)?;
    source.load_panel().await
}
