//! Integration tests for the update cycle against a scripted provider.
//!
//! Tests:
//! 1. First update writes the full provider history
//! 2. Incremental update replaces the last stored day and appends the rest
//! 3. Empty incremental window still regenerates technicals and advances the registry
//! 4. Overlapping provider window surfaces as a date conflict and rolls back
//! 5. Fetch failures leave the series and registry untouched
//! 6. Batches continue past failures and stop when the provider is blocked
//! 7. maintain() refreshes every registered symbol

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use pricedb_core::data::{DataError, DataProvider, DataSource, FetchResult, NoProgress};
use pricedb_core::domain::{Bar, DateRange};
use pricedb_core::{PriceStore, Reader, UpdateError, UpdateMode, Updater, WriteMode};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ── Helpers ──────────────────────────────────────────────────────────

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Weekday bars from `start` through `end`, closes rising by 1.0 per bar.
fn weekday_bars(start: NaiveDate, end: NaiveDate, first_close: f64) -> Vec<Bar> {
    let mut bars = Vec::new();
    let mut date = start;
    let mut close = first_close;
    while date <= end {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            bars.push(Bar {
                date,
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 10_000,
                dividends: 0.0,
                stock_splits: 0.0,
            });
            close += 1.0;
        }
        date += Duration::days(1);
    }
    bars
}

#[derive(Default)]
struct MockProvider {
    history: HashMap<String, Vec<Bar>>,
    failing: HashSet<String>,
    /// Ignore the requested start date and return everything up to `end`.
    overlap: bool,
    /// Report unavailable after the first failed fetch.
    block_on_failure: bool,
    blocked: AtomicBool,
    calls: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl MockProvider {
    fn with_history(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.history.insert(symbol.to_string(), bars);
        self
    }

    fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    fn calls(&self) -> Vec<(String, NaiveDate, NaiveDate)> {
        self.calls.lock().unwrap().clone()
    }
}

impl DataProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        self.calls
            .lock()
            .unwrap()
            .push((symbol.to_string(), start, end));

        if self.failing.contains(symbol) {
            if self.block_on_failure {
                self.blocked.store(true, Ordering::SeqCst);
            }
            return Err(DataError::NetworkUnreachable("connection refused".into()));
        }

        let bars = self
            .history
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| (self.overlap || b.date >= start) && b.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Synthetic,
        })
    }

    fn is_available(&self) -> bool {
        !self.blocked.load(Ordering::SeqCst)
    }
}

/// Store holding XOM bars through 2024-02-02 with a partial last day.
fn store_with_partial_day(history: &[Bar]) -> PriceStore {
    let mut store = PriceStore::open_in_memory().unwrap();
    let mut stored: Vec<Bar> = history
        .iter()
        .filter(|b| b.date <= d(2024, 2, 2))
        .cloned()
        .collect();
    if let Some(last) = stored.last_mut() {
        last.close = -1.0;
    }
    store.write_bars("XOM", &stored, WriteMode::Replace).unwrap();
    store.upsert_registry("XOM", d(2024, 2, 2)).unwrap();
    store
}

// ── 1. Full history ──────────────────────────────────────────────────

#[test]
fn first_update_stores_full_history() {
    let history = weekday_bars(d(2023, 1, 2), d(2024, 2, 9), 50.0);
    let provider = MockProvider::default().with_history("XOM", history.clone());
    let mut store = PriceStore::open_in_memory().unwrap();

    let report = Updater::new(&mut store, &provider)
        .with_today(d(2024, 2, 9))
        .update_symbol("XOM")
        .unwrap();
    assert_eq!(report.mode, UpdateMode::FullHistory);
    assert_eq!(report.bars_written, history.len());

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, d(1900, 1, 1));

    let reader = Reader::new(&store);
    let series = reader.get_price_series("XOM", None, None).unwrap().unwrap();
    assert_eq!(series, history);
    assert!(series.windows(2).all(|w| w[0].date < w[1].date));

    let technicals = reader.get_indicator_series("XOM", None, None).unwrap().unwrap();
    assert_eq!(technicals.len(), series.len());
    assert_eq!(
        store.registry_entry("XOM").unwrap().unwrap().last_updated,
        Some(d(2024, 2, 9))
    );
}

#[test]
fn unknown_symbol_writes_nothing() {
    let provider = MockProvider::default();
    let mut store = PriceStore::open_in_memory().unwrap();

    let err = Updater::new(&mut store, &provider)
        .with_today(d(2024, 2, 9))
        .update_symbol("NOPE")
        .unwrap_err();
    assert!(matches!(
        err,
        UpdateError::Fetch {
            source: DataError::SymbolNotFound { .. },
            ..
        }
    ));
    assert!(store.registry_entry("NOPE").unwrap().is_none());
    assert!(Reader::new(&store).get_table("NOPE_timeseries").unwrap().is_none());
}

// ── 2. Incremental ───────────────────────────────────────────────────

#[test]
fn incremental_update_refreshes_last_day() {
    let history = weekday_bars(d(2024, 1, 2), d(2024, 2, 9), 50.0);
    let provider = MockProvider::default().with_history("XOM", history.clone());
    let mut store = store_with_partial_day(&history);

    let report = Updater::new(&mut store, &provider)
        .with_today(d(2024, 2, 9))
        .update_symbol("XOM")
        .unwrap();
    assert_eq!(report.mode, UpdateMode::Incremental { from: d(2024, 2, 2) });
    // 02-02 again plus 02-05..02-09
    assert_eq!(report.bars_written, 6);
    assert_eq!(provider.calls()[0], ("XOM".to_string(), d(2024, 2, 2), d(2024, 2, 9)));

    let series = store.load_bars("XOM", DateRange::all()).unwrap();
    assert_eq!(series, history);
    assert!(report.last_date >= Some(d(2024, 2, 2)));
}

#[test]
fn empty_window_still_advances_registry() {
    let history = weekday_bars(d(2024, 1, 2), d(2024, 2, 2), 50.0);
    // provider knows nothing past 02-01, so the 02-02..02-04 window is empty
    let provider = MockProvider::default().with_history(
        "XOM",
        history.iter().filter(|b| b.date < d(2024, 2, 2)).cloned().collect(),
    );
    let mut store = PriceStore::open_in_memory().unwrap();
    store.write_bars("XOM", &history, WriteMode::Replace).unwrap();
    store.upsert_registry("XOM", d(2024, 2, 2)).unwrap();

    let report = Updater::new(&mut store, &provider)
        .with_today(d(2024, 2, 4))
        .update_symbol("XOM")
        .unwrap();
    assert_eq!(report.bars_written, 0);
    assert_eq!(report.technicals_written, history.len());
    assert_eq!(store.load_bars("XOM", DateRange::all()).unwrap(), history);
    assert_eq!(
        store.registry_entry("XOM").unwrap().unwrap().last_updated,
        Some(d(2024, 2, 4))
    );
}

// ── 3. Conflicts and failures ────────────────────────────────────────

#[test]
fn overlapping_window_is_a_date_conflict() {
    let history = weekday_bars(d(2024, 1, 2), d(2024, 2, 9), 50.0);
    let mut provider = MockProvider::default().with_history("XOM", history.clone());
    provider.overlap = true;
    let mut store = store_with_partial_day(&history);
    let before = store.load_bars("XOM", DateRange::all()).unwrap();

    let err = Updater::new(&mut store, &provider)
        .with_today(d(2024, 2, 9))
        .update_symbol("XOM")
        .unwrap_err();
    assert!(err.is_date_conflict(), "unexpected error: {err}");

    // the stale row removal rolled back with the failed append
    assert_eq!(store.load_bars("XOM", DateRange::all()).unwrap(), before);
    assert_eq!(
        store.registry_entry("XOM").unwrap().unwrap().last_updated,
        Some(d(2024, 2, 2))
    );
}

#[test]
fn fetch_failure_leaves_store_untouched() {
    let history = weekday_bars(d(2024, 1, 2), d(2024, 2, 9), 50.0);
    let provider = MockProvider::default()
        .with_history("XOM", history.clone())
        .failing("XOM");
    let mut store = store_with_partial_day(&history);
    let before = store.load_bars("XOM", DateRange::all()).unwrap();

    let err = Updater::new(&mut store, &provider)
        .with_today(d(2024, 2, 9))
        .update_symbol("XOM")
        .unwrap_err();
    assert!(matches!(err, UpdateError::Fetch { .. }));
    assert!(!err.is_date_conflict());
    assert_eq!(store.load_bars("XOM", DateRange::all()).unwrap(), before);
    assert_eq!(
        store.registry_entry("XOM").unwrap().unwrap().last_updated,
        Some(d(2024, 2, 2))
    );
}

// ── 4. Batches ───────────────────────────────────────────────────────

#[test]
fn batch_continues_past_failures() {
    let history = weekday_bars(d(2024, 1, 2), d(2024, 2, 9), 50.0);
    let provider = MockProvider::default()
        .with_history("AAA", history.clone())
        .with_history("CCC", history)
        .failing("BBB");
    let mut store = PriceStore::open_in_memory().unwrap();

    let summary = Updater::new(&mut store, &provider)
        .with_today(d(2024, 2, 9))
        .update_symbols(&["AAA", "BBB", "CCC"], &NoProgress);

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert!(!summary.all_succeeded());
    let order: Vec<&str> = summary.outcomes.iter().map(|o| o.symbol.as_str()).collect();
    assert_eq!(order, vec!["AAA", "BBB", "CCC"]);
    let failures: Vec<&str> = summary.failures().map(|(s, _)| s).collect();
    assert_eq!(failures, vec!["BBB"]);

    let registered: Vec<String> = store
        .list_symbols()
        .unwrap()
        .into_iter()
        .map(|e| e.symbol)
        .collect();
    assert_eq!(registered, vec!["AAA", "CCC"]);
}

#[test]
fn blocked_provider_stops_the_batch() {
    let history = weekday_bars(d(2024, 1, 2), d(2024, 2, 9), 50.0);
    let mut provider = MockProvider::default()
        .with_history("AAA", history.clone())
        .with_history("CCC", history)
        .failing("BBB");
    provider.block_on_failure = true;
    let mut store = PriceStore::open_in_memory().unwrap();

    let summary = Updater::new(&mut store, &provider)
        .with_today(d(2024, 2, 9))
        .update_symbols(&["AAA", "BBB", "CCC"], &NoProgress);

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(provider.calls().len(), 2);
    let last = summary.outcomes.last().unwrap();
    assert!(matches!(
        last.result,
        Err(UpdateError::Fetch {
            source: DataError::CircuitBreakerTripped,
            ..
        })
    ));
}

#[test]
fn maintain_refreshes_registered_symbols() {
    let history = weekday_bars(d(2024, 1, 2), d(2024, 2, 9), 50.0);
    let provider = MockProvider::default()
        .with_history("XOM", history.clone())
        .with_history("TSLA", history.clone());
    let mut store = PriceStore::open_in_memory().unwrap();
    {
        let mut updater = Updater::new(&mut store, &provider).with_today(d(2024, 2, 2));
        assert!(updater
            .update_symbols(&["XOM", "TSLA"], &NoProgress)
            .all_succeeded());
    }

    let summary = Updater::new(&mut store, &provider)
        .with_today(d(2024, 2, 9))
        .maintain(&NoProgress)
        .unwrap();
    assert_eq!(summary.total, 2);
    assert!(summary.all_succeeded());

    for entry in store.list_symbols().unwrap() {
        assert_eq!(entry.last_updated, Some(d(2024, 2, 9)));
        assert_eq!(store.load_bars(&entry.symbol, DateRange::all()).unwrap(), history);
    }
}

#[test]
fn maintain_on_empty_registry_is_a_no_op() {
    let provider = MockProvider::default();
    let mut store = PriceStore::open_in_memory().unwrap();
    let summary = Updater::new(&mut store, &provider)
        .maintain(&NoProgress)
        .unwrap();
    assert_eq!(summary.total, 0);
    assert!(provider.calls().is_empty());
}
