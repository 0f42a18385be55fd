//! Price series reads and writes.

use super::schema::{INSERT_BAR, SELECT_BARS};
use super::{
    format_date, is_constraint_violation, nullable, parse_date, PriceStore, StoreError, WriteMode,
};
use crate::domain::{normalize_symbol, Bar, DateRange};
use chrono::NaiveDate;
use rusqlite::{params, Connection};

impl PriceStore {
    /// Insert `bars` for `symbol`, returning the number of rows written.
    ///
    /// The write is all-or-nothing: a duplicate date rolls back every row of
    /// this call and surfaces as `StoreError::DateConflict`.
    pub fn write_bars(&mut self, symbol: &str, bars: &[Bar], mode: WriteMode) -> Result<usize, StoreError> {
        let ticker = normalize_symbol(symbol)?;
        let tx = self.conn.transaction()?;
        if mode == WriteMode::Replace {
            let removed = tx.execute("DELETE FROM timeseries WHERE Ticker = ?1", params![ticker])?;
            tracing::debug!(symbol = %ticker, removed, "replacing price series");
        }
        let written = insert_bars(&tx, &ticker, bars)?;
        tx.commit()?;
        Ok(written)
    }

    /// Drop the stored row for `stale` and append `bars` in one transaction.
    ///
    /// Used for incremental updates: the last stored bar may have been written
    /// mid-session, so it is re-fetched along with everything after it.
    pub fn refresh_tail(&mut self, symbol: &str, stale: NaiveDate, bars: &[Bar]) -> Result<usize, StoreError> {
        let ticker = normalize_symbol(symbol)?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM timeseries WHERE Ticker = ?1 AND Date = ?2",
            params![ticker, format_date(stale)],
        )?;
        let written = insert_bars(&tx, &ticker, bars)?;
        tx.commit()?;
        Ok(written)
    }

    /// Latest stored date for `symbol`, or `None` if it has no rows.
    pub fn most_recent_date(&self, symbol: &str) -> Result<Option<NaiveDate>, StoreError> {
        let ticker = normalize_symbol(symbol)?;
        let max: Option<String> = self.conn.query_row(
            "SELECT MAX(Date) FROM timeseries WHERE Ticker = ?1",
            params![ticker],
            |row| row.get(0),
        )?;
        max.as_deref().map(parse_date).transpose()
    }

    pub fn has_price_series(&self, symbol: &str) -> Result<bool, StoreError> {
        Ok(self.most_recent_date(symbol)?.is_some())
    }

    /// Stored bars for `symbol` within `range`, ascending by date.
    pub fn load_bars(&self, symbol: &str, range: DateRange) -> Result<Vec<Bar>, StoreError> {
        let ticker = normalize_symbol(symbol)?;
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare_cached(SELECT_BARS)?;
        let rows = stmt.query_map(
            params![ticker, range.start.map(format_date), range.end.map(format_date)],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                    row.get::<_, Option<f64>>(6)?,
                    row.get::<_, Option<f64>>(7)?,
                ))
            },
        )?;

        let mut bars = Vec::new();
        for row in rows {
            let (date, open, high, low, close, volume, dividends, splits) = row?;
            bars.push(Bar {
                date: parse_date(&date)?,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.and_then(|v| u64::try_from(v).ok()).unwrap_or(0),
                dividends: dividends.unwrap_or(0.0),
                stock_splits: splits.unwrap_or(0.0),
            });
        }
        Ok(bars)
    }
}

fn insert_bars(conn: &Connection, ticker: &str, bars: &[Bar]) -> Result<usize, StoreError> {
    let mut stmt = conn.prepare_cached(INSERT_BAR)?;
    for bar in bars {
        stmt.execute(params![
            ticker,
            format_date(bar.date),
            nullable(bar.open),
            nullable(bar.high),
            nullable(bar.low),
            nullable(bar.close),
            i64::try_from(bar.volume).unwrap_or(i64::MAX),
            nullable(bar.dividends),
            nullable(bar.stock_splits),
        ])
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::DateConflict {
                    symbol: ticker.to_string(),
                    date: bar.date,
                }
            } else {
                StoreError::Sqlite(e)
            }
        })?;
    }
    Ok(bars.len())
}
