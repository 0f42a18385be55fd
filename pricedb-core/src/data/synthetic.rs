//! Synthetic price provider for offline runs and demos.
//!
//! Generates a deterministic random walk per symbol, seeded from the BLAKE3
//! hash of the symbol. The walk always starts at the same origin date, so any
//! requested window returns the same bars for the same dates. Weekends are
//! skipped; there are no holidays.

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::{Bar, DateRange};
use chrono::{Datelike, NaiveDate, TimeDelta, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct SyntheticProvider {
    origin: NaiveDate,
}

impl SyntheticProvider {
    pub fn new(origin: NaiveDate) -> Self {
        Self { origin }
    }

    fn generate(&self, symbol: &str, end: NaiveDate) -> Vec<Bar> {
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut bars = Vec::new();
        let mut price = 100.0_f64;
        let mut current = self.origin;

        while current <= end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += TimeDelta::days(1);
                continue;
            }

            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            bars.push(Bar {
                date: current,
                open,
                high,
                low,
                close,
                volume,
                dividends: 0.0,
                stock_splits: 0.0,
            });

            price = close;
            current += TimeDelta::days(1);
        }

        bars
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(NaiveDate::from_ymd_opt(2015, 1, 2).unwrap_or_default())
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        let window = DateRange::new(Some(start), Some(end));
        let bars = self
            .generate(symbol, end)
            .into_iter()
            .filter(|b| window.contains(b.date))
            .collect();
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Synthetic,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}
