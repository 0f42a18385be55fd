//! Read side of the price database.
//!
//! Typed reads (`get_price_series`, `get_indicator_series`) return `None`
//! when the symbol has no stored series, so callers can tell "no data yet"
//! from a fault. `get_table` hands back a polars `DataFrame` for any table
//! name, including the per-symbol logical names `{SYMBOL}_timeseries` and
//! `{SYMBOL}_technicals`.

use crate::domain::{normalize_symbol, Bar, DateRange, TechnicalRow};
use crate::store::schema::{
    PRICES_SUFFIX, PRICES_TABLE, PRICE_COLUMNS, TECHNICALS_SUFFIX, TECHNICALS_TABLE,
};
use crate::store::{PriceStore, StoreError};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use rusqlite::types::Value;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Price and indicator rows for one symbol over the same date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerData {
    pub symbol: String,
    pub price: Vec<Bar>,
    pub technicals: Vec<TechnicalRow>,
}

enum TableRef {
    Prices(String),
    Technicals(String),
    Physical(String),
}

fn resolve(name: &str) -> TableRef {
    let logical = |suffix: &str| {
        name.strip_suffix(suffix)
            .and_then(|prefix| normalize_symbol(prefix).ok())
    };
    if let Some(symbol) = logical(PRICES_SUFFIX) {
        TableRef::Prices(symbol)
    } else if let Some(symbol) = logical(TECHNICALS_SUFFIX) {
        TableRef::Technicals(symbol)
    } else {
        TableRef::Physical(name.to_string())
    }
}

pub struct Reader<'a> {
    store: &'a PriceStore,
}

impl<'a> Reader<'a> {
    pub fn new(store: &'a PriceStore) -> Self {
        Self { store }
    }

    /// Full contents of `name`, or `None` if there is no such table.
    pub fn get_table(&self, name: &str) -> Result<Option<DataFrame>, StoreError> {
        match resolve(name) {
            TableRef::Prices(symbol) => self
                .get_price_series(&symbol, None, None)?
                .map(|bars| bars_to_frame(&bars))
                .transpose(),
            TableRef::Technicals(symbol) => self
                .get_indicator_series(&symbol, None, None)?
                .map(|rows| technicals_to_frame(&rows))
                .transpose(),
            TableRef::Physical(name) => {
                if self.physical_table_exists(&name)? {
                    read_physical_table(self.store, &name).map(Some)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Stored bars for `symbol` with `start <= date <= end`.
    ///
    /// `None` when the symbol has no price series; an empty vec when it has
    /// one but nothing falls inside the range.
    pub fn get_price_series(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Option<Vec<Bar>>, StoreError> {
        if !self.store.has_price_series(symbol)? {
            return Ok(None);
        }
        self.store
            .load_bars(symbol, DateRange::new(start, end))
            .map(Some)
    }

    /// Stored indicator rows for `symbol` with `start <= date <= end`.
    pub fn get_indicator_series(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Option<Vec<TechnicalRow>>, StoreError> {
        if !self.store.has_technicals(symbol)? {
            return Ok(None);
        }
        self.store
            .load_technicals(symbol, DateRange::new(start, end))
            .map(Some)
    }

    /// Price and technicals together. Technicals are empty if they have not
    /// been generated yet.
    pub fn get_ticker_data(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Option<TickerData>, StoreError> {
        let Some(price) = self.get_price_series(symbol, start, end)? else {
            return Ok(None);
        };
        let technicals = self
            .get_indicator_series(symbol, start, end)?
            .unwrap_or_default();
        Ok(Some(TickerData {
            symbol: normalize_symbol(symbol)?,
            price,
            technicals,
        }))
    }

    /// Physical tables plus one logical name per stored series, sorted.
    pub fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.store.conn();
        let mut names = Vec::new();

        let mut stmt =
            conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")?;
        for name in stmt.query_map([], |row| row.get::<_, String>(0))? {
            names.push(name?);
        }

        for (table, suffix) in [(PRICES_TABLE, PRICES_SUFFIX), (TECHNICALS_TABLE, TECHNICALS_SUFFIX)] {
            let mut stmt = conn.prepare(&format!("SELECT DISTINCT Ticker FROM {table}"))?;
            for ticker in stmt.query_map([], |row| row.get::<_, String>(0))? {
                names.push(format!("{}{suffix}", ticker?));
            }
        }

        names.sort();
        Ok(names)
    }

    fn physical_table_exists(&self, name: &str) -> Result<bool, StoreError> {
        let found: Option<String> = self
            .store
            .conn()
            .query_row(
                "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

fn frame_err(e: PolarsError) -> StoreError {
    StoreError::Frame(e.to_string())
}

fn date_column(dates: impl Iterator<Item = NaiveDate>) -> Result<Column, StoreError> {
    let days: Vec<i32> = dates
        .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    Column::new("Date".into(), days)
        .cast(&DataType::Date)
        .map_err(frame_err)
}

/// Bars as a frame with the stored column names.
pub fn bars_to_frame(bars: &[Bar]) -> Result<DataFrame, StoreError> {
    let f64_col = |name: &str, get: fn(&Bar) -> f64| {
        Column::new(name.into(), bars.iter().map(get).collect::<Vec<f64>>())
    };
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        date_column(bars.iter().map(|b| b.date))?,
        f64_col(PRICE_COLUMNS[1], |b| b.open),
        f64_col(PRICE_COLUMNS[2], |b| b.high),
        f64_col(PRICE_COLUMNS[3], |b| b.low),
        f64_col(PRICE_COLUMNS[4], |b| b.close),
        Column::new(PRICE_COLUMNS[5].into(), volumes),
        f64_col(PRICE_COLUMNS[6], |b| b.dividends),
        f64_col(PRICE_COLUMNS[7], |b| b.stock_splits),
    ])
    .map_err(frame_err)
}

/// Indicator rows as a frame; warmup values are nulls.
pub fn technicals_to_frame(rows: &[TechnicalRow]) -> Result<DataFrame, StoreError> {
    let mut columns = vec![date_column(rows.iter().map(|r| r.date))?];
    let values: Vec<[Option<f64>; 13]> = rows.iter().map(TechnicalRow::values).collect();
    for (i, name) in TechnicalRow::VALUE_COLUMNS.iter().enumerate() {
        let col: Vec<Option<f64>> = values.iter().map(|v| v[i]).collect();
        columns.push(Column::new((*name).into(), col));
    }
    DataFrame::new(columns).map_err(frame_err)
}

/// `"name"` with embedded quotes doubled.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn read_physical_table(store: &PriceStore, name: &str) -> Result<DataFrame, StoreError> {
    let mut stmt = store
        .conn()
        .prepare(&format!("SELECT * FROM {}", quote_ident(name)))?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        for (i, col) in cells.iter_mut().enumerate() {
            col.push(row.get::<_, Value>(i)?);
        }
    }

    let columns = names
        .iter()
        .zip(cells)
        .map(|(name, values)| sql_column(name, values))
        .collect();
    DataFrame::new(columns).map_err(frame_err)
}

/// Pick a column type from the SQLite storage classes actually present:
/// all-integer becomes Int64, numeric becomes Float64, anything else String.
fn sql_column(name: &str, values: Vec<Value>) -> Column {
    let all_null = values.iter().all(|v| matches!(v, Value::Null));
    let all_int = values
        .iter()
        .all(|v| matches!(v, Value::Null | Value::Integer(_)));
    let all_num = values
        .iter()
        .all(|v| matches!(v, Value::Null | Value::Integer(_) | Value::Real(_)));

    if all_int && !all_null {
        let col: Vec<Option<i64>> = values
            .into_iter()
            .map(|v| match v {
                Value::Integer(i) => Some(i),
                _ => None,
            })
            .collect();
        Column::new(name.into(), col)
    } else if all_num {
        let col: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| match v {
                Value::Integer(i) => Some(i as f64),
                Value::Real(f) => Some(f),
                _ => None,
            })
            .collect();
        Column::new(name.into(), col)
    } else {
        let col: Vec<Option<String>> = values
            .into_iter()
            .map(|v| match v {
                Value::Null => None,
                Value::Integer(i) => Some(i.to_string()),
                Value::Real(f) => Some(f.to_string()),
                Value::Text(s) => Some(s),
                Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
            })
            .collect();
        Column::new(name.into(), col)
    }
}
