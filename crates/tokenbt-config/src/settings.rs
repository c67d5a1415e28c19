//! Configuration structures.

use config::ConfigError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokenbt_strategies::StrategyKind;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub backtest: BacktestSettings,
}

impl AppConfig {
    /// Check values the deserializer cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.validate()?;
        self.backtest.validate()
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "tokenbt".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl LoggingConfig {
    /// Whether JSON output is selected.
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.format.to_ascii_lowercase().as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(ConfigError::Message(format!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                other
            ))),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Backtest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    /// Strategy variant name
    pub strategy: String,
    pub initial_capital: Decimal,
    pub rebalance_days: usize,
    /// CSV file or directory of CSV files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<String>,
    /// Directory for report output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    /// Partial overrides of the strategy parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    /// Partial overrides of the strategy's simulator policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<serde_json::Value>,
}

impl BacktestSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        self.strategy
            .parse::<StrategyKind>()
            .map_err(|e| ConfigError::Message(format!("backtest.strategy: {}", e)))?;
        if self.initial_capital <= Decimal::ZERO {
            return Err(ConfigError::Message(
                "backtest.initial_capital must be positive".into(),
            ));
        }
        if self.rebalance_days == 0 {
            return Err(ConfigError::Message(
                "backtest.rebalance_days must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for BacktestSettings {
    fn default() -> Self {
        use rust_decimal_macros::dec;
        Self {
            strategy: StrategyKind::ReversionMomentum.as_str().to_string(),
            initial_capital: dec!(10000),
            rebalance_days: 7,
            data_path: None,
            output_dir: None,
            params: None,
            profile: None,
        }
    }
}
