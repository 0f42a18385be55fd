//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars plus dividend and split events from Yahoo's v8
//! chart API. Handles retries with exponential backoff, response parsing, and
//! the circuit breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; parse failures surface as `DataError::ResponseFormatChanged`.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{sort_and_check, DataError, DataProvider, DataSource, FetchResult};
use crate::config::ProviderConfig;
use crate::domain::{Bar, DateRange};
use chrono::{NaiveDate, NaiveTime, TimeDelta};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
    events: Option<Events>,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds; bar timestamps are market open.
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct Events {
    dividends: Option<HashMap<String, DividendEvent>>,
    splits: Option<HashMap<String, SplitEvent>>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct SplitEvent {
    date: i64,
    numerator: f64,
    denominator: f64,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>, config: &ProviderConfig) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
        })
    }

    /// Build the chart API URL for a symbol and inclusive date range.
    ///
    /// Bars are stamped at the exchange-local open, which for exchanges east
    /// of UTC falls on the previous UTC day. The request starts a day early
    /// and `parse_response` drops whatever lands outside the window.
    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = (start - TimeDelta::days(1))
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();
        // Exclusive upper bound: midnight after `end`.
        let end_ts = (end + TimeDelta::days(1)).and_time(NaiveTime::MIN).and_utc().timestamp();
        format!(
            "{}/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &events=div%7Csplit&includeAdjustedClose=false",
            self.base_url
        )
    }

    /// Parse the chart API response into bars dated within `window`.
    ///
    /// A result without timestamps means the window held no trading days and
    /// yields an empty vector.
    fn parse_response(
        symbol: &str,
        window: DateRange,
        resp: ChartResponse,
    ) -> Result<Vec<Bar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let offset = data.meta.as_ref().and_then(|m| m.gmtoffset).unwrap_or(0);

        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

        let mut dividends: HashMap<NaiveDate, f64> = HashMap::new();
        let mut splits: HashMap<NaiveDate, f64> = HashMap::new();
        if let Some(events) = data.events {
            for ev in events.dividends.into_iter().flat_map(|m| m.into_values()) {
                *dividends.entry(exchange_date(ev.date, offset)?).or_default() += ev.amount;
            }
            for ev in events.splits.into_iter().flat_map(|m| m.into_values()) {
                if ev.denominator != 0.0 {
                    splits.insert(exchange_date(ev.date, offset)?, ev.numerator / ev.denominator);
                }
            }
        }

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = exchange_date(ts, offset)?;
            if !window.contains(date) {
                continue;
            }

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // No close means no trade on this day (halt or placeholder row).
            let Some(close) = quote.close.get(i).copied().flatten() else {
                tracing::debug!(symbol, %date, "skipping bar without close");
                continue;
            };

            let bar = Bar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close,
                volume: volume.unwrap_or(0),
                dividends: dividends.get(&date).copied().unwrap_or(0.0),
                stock_splits: splits.get(&date).copied().unwrap_or(0.0),
            };
            if !bar.is_sane() {
                tracing::debug!(symbol, %date, "bar fails OHLC sanity check; stored as reported");
            }
            bars.push(bar);
        }

        sort_and_check(symbol, bars)
    }

    /// Execute the request with retry and circuit breaker logic.
    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        if !self.circuit_breaker.is_allowed() {
            tracing::warn!(
                symbol,
                cooldown = ?self.circuit_breaker.remaining_cooldown(),
                "provider blocked; skipping request"
            );
            return Err(DataError::CircuitBreakerTripped);
        }

        let window = DateRange::new(Some(start), Some(end));
        let url = self.chart_url(symbol, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.base_delay, attempt);
                tracing::debug!(symbol, attempt, ?delay, "retrying provider request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        self.circuit_breaker.trip();
                        return Err(DataError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(DataError::AuthenticationRequired(
                            "Yahoo Finance requires authentication".into(),
                        ));
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;

                    let bars = Self::parse_response(symbol, window, chart)?;
                    self.circuit_breaker.record_success();
                    return Ok(bars);
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// Wait before retry `attempt` (1-based): doubles each time, saturating.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

/// Convert a UTC epoch timestamp to the exchange-local calendar date.
fn exchange_date(ts: i64, gmtoffset: i64) -> Result<NaiveDate, DataError> {
    chrono::DateTime::from_timestamp(ts + gmtoffset, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        tracing::debug!(symbol, %start, %end, "fetching from yahoo");
        let bars = self.fetch_with_retry(symbol, start, end)?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
