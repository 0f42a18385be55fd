//! Updater: brings stored price series up to date and regenerates technicals.
//!
//! Per symbol the sequence is fetch, write prices, regenerate technicals,
//! advance the registry. The fetch happens before anything is touched, so a
//! provider failure leaves the stored series and the registry as they were.
//! The price write and the registry write commit separately; a crash between
//! them leaves a stale registry date that the next run repairs.

use crate::config::{ConfigError, IndicatorConfig};
use crate::data::{DataError, DataProvider, FetchResult, UpdateProgress};
use crate::domain::normalize_symbol;
use crate::indicators::update_indicators;
use crate::store::{PriceStore, StoreError, WriteMode};
use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("fetch failed for {symbol}: {source}")]
    Fetch { symbol: String, source: DataError },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl UpdateError {
    /// True when a date collided: an append hit a stored date, or the
    /// provider returned the same day twice.
    pub fn is_date_conflict(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::DateConflict { .. })
                | Self::Fetch {
                    source: DataError::DuplicateDate { .. },
                    ..
                }
        )
    }
}

/// Which path `update_symbol` took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// No stored series; full history fetched and written fresh.
    FullHistory,
    /// Stored series ended at `from`; that row was re-fetched with everything after it.
    Incremental { from: NaiveDate },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub symbol: String,
    pub mode: UpdateMode,
    pub bars_written: usize,
    pub technicals_written: usize,
    pub last_date: Option<NaiveDate>,
}

#[derive(Debug)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub result: Result<UpdateReport, UpdateError>,
}

/// Per-symbol results of a batch, in input order.
#[derive(Debug)]
pub struct UpdateSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<SymbolOutcome>,
}

impl UpdateSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &UpdateError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.symbol.as_str(), e)))
    }
}

pub struct Updater<'a> {
    store: &'a mut PriceStore,
    provider: &'a dyn DataProvider,
    indicators: IndicatorConfig,
    today: Option<NaiveDate>,
}

impl<'a> Updater<'a> {
    pub fn new(store: &'a mut PriceStore, provider: &'a dyn DataProvider) -> Self {
        Self {
            store,
            provider,
            indicators: IndicatorConfig::default(),
            today: None,
        }
    }

    /// Replace the indicator windows; rejects values the indicators cannot run with.
    pub fn with_indicator_config(mut self, config: IndicatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.indicators = config;
        Ok(self)
    }

    /// Pin "today" instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Update one symbol.
    ///
    /// With no stored series the full provider history is written in replace
    /// mode. Otherwise the window from the last stored date D through today
    /// is fetched; the row for D is swapped for the fresh one and later rows
    /// are appended. An empty window leaves prices alone but still
    /// regenerates technicals and advances the registry.
    pub fn update_symbol(&mut self, symbol: &str) -> Result<UpdateReport, UpdateError> {
        let ticker = normalize_symbol(symbol).map_err(StoreError::from)?;
        let today = self.today();
        let fetch_err = |source| UpdateError::Fetch {
            symbol: ticker.clone(),
            source,
        };

        let (mode, bars_written) = match self.store.most_recent_date(&ticker)? {
            None => {
                debug!(symbol = %ticker, end = %today, "fetching full history");
                let fetched = self
                    .provider
                    .fetch_full_history(&ticker, today)
                    .map_err(fetch_err)?;
                log_fetch(&fetched);
                if fetched.bars.is_empty() {
                    return Err(fetch_err(DataError::SymbolNotFound {
                        symbol: ticker.clone(),
                    }));
                }
                let written = self.store.write_bars(&ticker, &fetched.bars, WriteMode::Replace)?;
                (UpdateMode::FullHistory, written)
            }
            Some(last) if last > today => {
                debug!(symbol = %ticker, last = %last, "stored series is ahead of today");
                (UpdateMode::Incremental { from: last }, 0)
            }
            Some(last) => {
                debug!(symbol = %ticker, start = %last, end = %today, "fetching window");
                let fetched = self
                    .provider
                    .fetch(&ticker, last, today)
                    .map_err(fetch_err)?;
                log_fetch(&fetched);
                let written = if fetched.bars.is_empty() {
                    0
                } else {
                    self.store.refresh_tail(&ticker, last, &fetched.bars)?
                };
                (UpdateMode::Incremental { from: last }, written)
            }
        };

        let technicals_written = update_indicators(self.store, &ticker, &self.indicators)?;
        self.store.upsert_registry(&ticker, today)?;
        let last_date = self.store.most_recent_date(&ticker)?;

        info!(
            symbol = %ticker,
            rows = bars_written,
            technicals = technicals_written,
            "series updated"
        );

        Ok(UpdateReport {
            symbol: ticker,
            mode,
            bars_written,
            technicals_written,
            last_date,
        })
    }

    /// Update each symbol in turn. A failure is recorded and the batch moves
    /// on, except when the provider becomes unavailable: the remaining
    /// symbols are then reported as failed without being requested.
    pub fn update_symbols(&mut self, symbols: &[&str], progress: &dyn UpdateProgress) -> UpdateSummary {
        let total = symbols.len();
        let mut outcomes = Vec::with_capacity(total);

        for (i, symbol) in symbols.iter().enumerate() {
            progress.on_start(symbol, i, total);
            let result = self.update_symbol(symbol);
            let message = result.as_ref().err().map(ToString::to_string);
            progress.on_complete(symbol, i, total, message.as_deref());
            outcomes.push(SymbolOutcome {
                symbol: symbol.to_string(),
                result,
            });

            if !self.provider.is_available() {
                for sym in &symbols[(i + 1)..] {
                    outcomes.push(SymbolOutcome {
                        symbol: sym.to_string(),
                        result: Err(UpdateError::Fetch {
                            symbol: sym.to_string(),
                            source: DataError::CircuitBreakerTripped,
                        }),
                    });
                }
                break;
            }
        }

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        let succeeded = outcomes.len() - failed;
        progress.on_batch_complete(succeeded, failed, total);

        UpdateSummary {
            total,
            succeeded,
            failed,
            outcomes,
        }
    }

    /// Refresh every symbol in the registry.
    pub fn maintain(&mut self, progress: &dyn UpdateProgress) -> Result<UpdateSummary, UpdateError> {
        let symbols: Vec<String> = self
            .store
            .list_symbols()?
            .into_iter()
            .map(|entry| entry.symbol)
            .collect();
        info!(count = symbols.len(), "maintaining registered symbols");
        let refs: Vec<&str> = symbols.iter().map(String::as_str).collect();
        Ok(self.update_symbols(&refs, progress))
    }
}

fn log_fetch(fetched: &FetchResult) {
    let corporate_actions = fetched
        .bars
        .iter()
        .filter(|b| b.has_corporate_action())
        .count();
    debug!(
        symbol = %fetched.symbol,
        source = ?fetched.source,
        bars = fetched.bars.len(),
        corporate_actions,
        "provider returned bars"
    );
}
