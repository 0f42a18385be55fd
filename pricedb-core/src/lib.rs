//! PriceDB Core: local daily price database with derived technicals.
//!
//! This crate contains:
//! - Domain types (bars, indicator rows, date ranges, symbols)
//! - Price providers (Yahoo Finance chart API, deterministic synthetic walk)
//! - SQLite store for the symbol registry, price series and technicals
//! - Indicator engine (volatility, SMA, EMA, MACD, RSI)
//! - Updater (full-history and incremental refresh, batch maintenance)
//! - Reader (typed series reads and polars frames)

pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod reader;
pub mod store;
pub mod updater;

pub use config::{ConfigError, IndicatorConfig, PriceDbConfig};
pub use reader::{Reader, TickerData};
pub use store::{PriceStore, StoreError, WriteMode};
pub use updater::{UpdateError, UpdateMode, UpdateReport, UpdateSummary, Updater};
