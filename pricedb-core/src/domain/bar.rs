//! Bar: one trading day of prices and corporate actions for a symbol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar plus the dividend and split events recorded on that day.
///
/// `dividends` and `stock_splits` are `0.0` on days without an event, the
/// same convention the provider uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub dividends: f64,
    pub stock_splits: f64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (provider gap).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.close > 0.0
    }

    /// True if a dividend or split was recorded on this bar.
    pub fn has_corporate_action(&self) -> bool {
        self.dividends != 0.0 || self.stock_splits != 0.0
    }
}

/// Returns true if bar dates are strictly increasing (sorted, no duplicates).
pub fn dates_strictly_increasing(bars: &[Bar]) -> bool {
    bars.windows(2).all(|w| w[0].date < w[1].date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000,
            dividends: 0.0,
            stock_splits: 0.0,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0; // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn corporate_action_flag() {
        let mut bar = sample_bar();
        assert!(!bar.has_corporate_action());
        bar.stock_splits = 4.0;
        assert!(bar.has_corporate_action());
    }

    #[test]
    fn strictly_increasing_rejects_duplicates() {
        let a = sample_bar();
        let mut b = sample_bar();
        assert!(!dates_strictly_increasing(&[a.clone(), b.clone()]));
        b.date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert!(dates_strictly_increasing(&[a, b]));
    }
}
