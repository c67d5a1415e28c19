//! CSV price panel source.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokenbt_core::error::DataError;
use tokenbt_core::traits::PriceSource;
use tokenbt_core::types::{PriceObservation, PricePanel};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "token_address", alias = "asset_id", alias = "symbol")]
    asset: Option<String>,
    #[serde(alias = "timestamp", alias = "Date", alias = "Timestamp")]
    date: String,
    #[serde(alias = "value", alias = "close", alias = "Close")]
    price: Option<f64>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(alias = "total_volume", alias = "Volume", default)]
    volume: Option<f64>,
}

/// Rows read from one file.
struct FileRows {
    observations: Vec<PriceObservation>,
    skipped: usize,
}

/// CSV source for daily price panels.
///
/// Accepts either a single long-format file holding every asset, or a
/// directory of per-asset files. Files without an asset column take the
/// asset identifier from the file stem.
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    /// Create a new CSV source.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Source path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// CSV files to load, in path order.
    async fn files(&self) -> Result<Vec<PathBuf>, DataError> {
        if !self.path.is_dir() {
            return Ok(vec![self.path.clone()]);
        }

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_csv = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if is_csv && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl PriceSource for CsvPriceSource {
    async fn load_panel(&self) -> Result<PricePanel, DataError> {
        let files = self.files().await?;
        if files.is_empty() {
            return Err(DataError::NoDataAvailable);
        }

        let mut tasks = JoinSet::new();
        for (index, file) in files.iter().cloned().enumerate() {
            tasks.spawn_blocking(move || (index, read_file(&file)));
        }

        let mut loaded: Vec<Option<FileRows>> = files.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, rows) = joined
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            loaded[index] = Some(rows?);
        }

        // Later files win on duplicate (asset, date) pairs
        let mut observations = Vec::new();
        let mut skipped = 0;
        for rows in loaded.into_iter().flatten() {
            skipped += rows.skipped;
            observations.extend(rows.observations);
        }

        if skipped > 0 {
            warn!(skipped, "Dropped rows without a positive price");
        }
        if observations.is_empty() {
            return Err(DataError::NoDataAvailable);
        }

        let panel = PricePanel::from_observations(observations)?;
        info!(
            path = %self.path.display(),
            files = files.len(),
            assets = panel.asset_count(),
            observations = panel.len(),
            "Loaded price panel"
        );
        Ok(panel)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Read every row of one CSV file.
fn read_file(path: &Path) -> Result<FileRows, DataError> {
    let fallback_asset = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| DataError::ParseError(format!("{}: {}", path.display(), e)))?;

    let mut observations = Vec::new();
    let mut skipped = 0;

    for result in reader.deserialize() {
        let record: CsvRecord =
            result.map_err(|e| DataError::ParseError(format!("{}: {}", path.display(), e)))?;

        let asset = match record.asset.filter(|a| !a.is_empty()) {
            Some(asset) => asset,
            None => fallback_asset.clone().ok_or_else(|| {
                DataError::ParseError(format!("{}: no asset column", path.display()))
            })?,
        };
        let date = parse_date(&record.date)?;

        let price = match record.price {
            Some(price) if price > 0.0 && price.is_finite() => price,
            _ => {
                debug!(asset = %asset, %date, "Skipping row without a positive price");
                skipped += 1;
                continue;
            }
        };

        observations.push(PriceObservation::new(
            asset,
            date,
            price,
            record.market_cap.filter(|v| v.is_finite()).unwrap_or(0.0),
            record.volume.filter(|v| v.is_finite()).unwrap_or(0.0),
        ));
    }

    Ok(FileRows {
        observations,
        skipped,
    })
}

/// Parse a calendar date from the timestamp formats seen in price exports.
pub fn parse_date(value: &str) -> Result<NaiveDate, DataError> {
    let value = value.trim();

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.date());
        }
    }

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
    for format in date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return Ok(d);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }

    // Unix timestamp, milliseconds if > 10 digits
    if let Ok(ts) = value.parse::<i64>() {
        let secs = if ts > 10_000_000_000 { ts / 1000 } else { ts };
        if let Some(dt) = DateTime::from_timestamp(secs, 0) {
            return Ok(dt.date_naive());
        }
    }

    Err(DataError::ParseError(format!("Could not parse date: {}", value)))
}
