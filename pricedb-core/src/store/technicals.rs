//! Indicator series storage.

use super::schema::{INSERT_TECHNICAL, SELECT_TECHNICALS};
use super::{format_date, nullable, parse_date, PriceStore, StoreError};
use crate::domain::{normalize_symbol, DateRange, TechnicalRow};
use rusqlite::params;

impl PriceStore {
    /// Swap the symbol's whole indicator series for `rows`.
    ///
    /// Delete and insert share one transaction: a reader sees either the old
    /// series or the new one, never an empty table.
    pub fn replace_technicals(&mut self, symbol: &str, rows: &[TechnicalRow]) -> Result<usize, StoreError> {
        let ticker = normalize_symbol(symbol)?;
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM technicals WHERE Ticker = ?1", params![ticker])?;
        {
            let mut stmt = tx.prepare_cached(INSERT_TECHNICAL)?;
            for row in rows {
                let v = row.values().map(|x| x.and_then(nullable));
                stmt.execute(params![
                    ticker,
                    format_date(row.date),
                    v[0],
                    v[1],
                    v[2],
                    v[3],
                    v[4],
                    v[5],
                    v[6],
                    v[7],
                    v[8],
                    v[9],
                    v[10],
                    v[11],
                    v[12],
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Stored indicator rows for `symbol` within `range`, ascending by date.
    pub fn load_technicals(&self, symbol: &str, range: DateRange) -> Result<Vec<TechnicalRow>, StoreError> {
        let ticker = normalize_symbol(symbol)?;
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare_cached(SELECT_TECHNICALS)?;
        let rows = stmt.query_map(
            params![ticker, range.start.map(format_date), range.end.map(format_date)],
            |row| {
                let date: String = row.get(0)?;
                let mut values = [None; 13];
                for (i, slot) in values.iter_mut().enumerate() {
                    *slot = row.get::<_, Option<f64>>(i + 1)?;
                }
                Ok((date, values))
            },
        )?;

        let mut out = Vec::new();
        for row in rows {
            let (date, v) = row?;
            out.push(TechnicalRow {
                date: parse_date(&date)?,
                close_price: v[0].unwrap_or(f64::NAN),
                one_m_volatility: v[1],
                three_m_volatility: v[2],
                twelve_sma: v[3],
                twenty_six_sma: v[4],
                fifty_sma: v[5],
                two_hundred_sma: v[6],
                twelve_ema: v[7],
                twenty_six_ema: v[8],
                fifty_ema: v[9],
                two_hundred_ema: v[10],
                macd: v[11],
                rsi: v[12],
            });
        }
        Ok(out)
    }

    pub fn has_technicals(&self, symbol: &str) -> Result<bool, StoreError> {
        let ticker = normalize_symbol(symbol)?;
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM technicals WHERE Ticker = ?1",
            params![ticker],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
