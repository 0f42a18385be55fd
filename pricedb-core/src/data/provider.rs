//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over price sources (Yahoo Finance, the
//! synthetic generator) so the updater can be driven by a mock in tests.

use crate::domain::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Earliest date requested for a "full history" fetch.
pub const FULL_HISTORY_START: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(d) => d,
    None => panic!("invalid full history start"),
};

/// Structured error types for provider operations.
///
/// Raw transport and decoding errors are mapped into these variants inside the
/// provider; nothing provider-specific leaks past this boundary.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    /// Two bars in one response fell on the same exchange day.
    #[error("{symbol}: provider returned duplicate date {date}")]
    DuplicateDate { symbol: String, date: NaiveDate },

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful fetch for a single symbol.
///
/// `bars` is sorted ascending by date and may be empty for a window that
/// contains no trading days.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Synthetic,
}

/// Trait for price providers.
///
/// Providers know nothing about the store; the updater decides which window
/// to request and where the bars go.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for a symbol over an inclusive date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;

    /// Fetch everything the provider has for a symbol up to `end`.
    fn fetch_full_history(&self, symbol: &str, end: NaiveDate) -> Result<FetchResult, DataError> {
        self.fetch(symbol, FULL_HISTORY_START, end)
    }

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

/// Sort bars by date and check for duplicate dates in a provider response.
pub fn sort_and_check(symbol: &str, mut bars: Vec<Bar>) -> Result<Vec<Bar>, DataError> {
    bars.sort_by_key(|b| b.date);
    if let Some(w) = bars.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(DataError::DuplicateDate {
            symbol: symbol.to_string(),
            date: w[0].date,
        });
    }
    Ok(bars)
}

/// Progress callback for multi-symbol updates.
pub trait UpdateProgress {
    /// Called when starting to update a symbol.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when a symbol update finishes; `error` is the failure message, if any.
    fn on_complete(&self, symbol: &str, index: usize, total: usize, error: Option<&str>);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that emits tracing events.
pub struct LogProgress;

impl UpdateProgress for LogProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        tracing::info!(symbol, "[{}/{}] updating", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, _index: usize, _total: usize, error: Option<&str>) {
        match error {
            None => tracing::info!(symbol, "update ok"),
            Some(e) => tracing::warn!(symbol, error = e, "update failed"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        tracing::info!(succeeded, failed, total, "batch complete");
    }
}

/// Progress reporter that does nothing.
pub struct NoProgress;

impl UpdateProgress for NoProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}
    fn on_complete(&self, _symbol: &str, _index: usize, _total: usize, _error: Option<&str>) {}
    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1,
            dividends: 0.0,
            stock_splits: 0.0,
        }
    }

    #[test]
    fn sort_and_check_orders_bars() {
        let bars = sort_and_check("SPY", vec![bar(4), bar(2), bar(3)]).unwrap();
        let days: Vec<u32> = bars.iter().map(|b| chrono::Datelike::day(&b.date)).collect();
        assert_eq!(days, vec![2, 3, 4]);
    }

    #[test]
    fn sort_and_check_rejects_duplicates() {
        let err = sort_and_check("SPY", vec![bar(2), bar(3), bar(2)]).unwrap_err();
        match err {
            DataError::DuplicateDate { symbol, date } => {
                assert_eq!(symbol, "SPY");
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
            }
            other => panic!("expected DuplicateDate, got {other:?}"),
        }
    }

    #[test]
    fn full_history_start_is_1900() {
        assert_eq!(FULL_HISTORY_START.to_string(), "1900-01-01");
    }
}
