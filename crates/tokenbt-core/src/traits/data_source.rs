//! Price source trait definitions.

use crate::error::DataError;
use crate::types::PricePanel;
use async_trait::async_trait;

/// Trait for sources that materialize a complete price panel.
///
/// The backtest core only ever sees the finished, immutable panel; sources
/// are free to do their own I/O scheduling while loading.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Load every observation the source holds.
    async fn load_panel(&self) -> Result<PricePanel, DataError>;

    /// Get the source name.
    fn name(&self) -> &str;
}
