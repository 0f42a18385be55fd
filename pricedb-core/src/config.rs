//! TOML configuration for the price database.
//!
//! Every section is optional; a missing file section falls back to defaults.
//!
//! ```toml
//! symbols = ["XOM", "TSLA"]
//!
//! [database]
//! path = "prices.sqlite"
//!
//! [provider]
//! max_retries = 5
//!
//! [indicators]
//! ema_spans = [12, 24, 50, 200]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceDbConfig {
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    pub indicators: IndicatorConfig,
    /// Symbols updated when none are given on the command line.
    pub symbols: Vec<String>,
}

impl PriceDbConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.provider.validate()?;
        self.indicators.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pricedb.sqlite"),
        }
    }
}

/// Backoff doubles per retry; past this the waits run to hours.
pub const MAX_RETRIES: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// How long the circuit breaker stays open after tripping.
    pub cooldown_secs: u64,
    pub failure_threshold: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query2.finance.yahoo.com".into(),
            timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 500,
            cooldown_secs: 30 * 60,
            failure_threshold: 3,
        }
    }
}

impl ProviderConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider.timeout_secs must be > 0".into()));
        }
        if self.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "provider.failure_threshold must be > 0".into(),
            ));
        }
        if self.max_retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "provider.max_retries must be <= {MAX_RETRIES}"
            )));
        }
        Ok(())
    }
}

/// Windows and spans for the technicals table.
///
/// Each array maps positionally onto the stored columns: `sma_periods` feeds
/// Twelve_SMA, Twenty_Six_SMA, Fifty_SMA, Two_Hundred_SMA; `ema_spans` feeds
/// the four EMA columns the same way. The second EMA span defaults to 24,
/// which is what the Twenty_Six_EMA column (and therefore MACD) has always
/// been computed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub volatility_windows: [usize; 2],
    pub sma_periods: [usize; 4],
    pub ema_spans: [usize; 4],
    pub rsi_period: usize,
    pub trading_days_per_year: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            volatility_windows: [21, 63],
            sma_periods: [12, 26, 50, 200],
            ema_spans: [12, 24, 50, 200],
            rsi_period: 14,
            trading_days_per_year: 252.0,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.volatility_windows.iter().any(|&w| w < 3) {
            return Err(ConfigError::Invalid(
                "indicators.volatility_windows must be >= 3".into(),
            ));
        }
        if self.sma_periods.iter().chain(&self.ema_spans).any(|&p| p == 0) {
            return Err(ConfigError::Invalid(
                "indicators.sma_periods and ema_spans must be >= 1".into(),
            ));
        }
        if self.rsi_period < 2 {
            return Err(ConfigError::Invalid("indicators.rsi_period must be >= 2".into()));
        }
        if self.trading_days_per_year.is_nan() || self.trading_days_per_year <= 0.0 {
            return Err(ConfigError::Invalid(
                "indicators.trading_days_per_year must be > 0".into(),
            ));
        }
        Ok(())
    }
}
