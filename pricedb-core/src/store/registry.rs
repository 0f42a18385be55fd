//! Symbol registry (`Summary` table): tracked symbols and their last update.

use super::{format_date, parse_date, PriceStore, StoreError};
use crate::domain::normalize_symbol;
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub symbol: String,
    pub last_updated: Option<NaiveDate>,
}

impl PriceStore {
    /// Insert or overwrite the registry row for `symbol`. Last write wins.
    pub fn upsert_registry(&self, symbol: &str, date: NaiveDate) -> Result<(), StoreError> {
        let ticker = normalize_symbol(symbol)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO Summary (Ticker, Last_updated) VALUES (?1, ?2)",
            params![ticker, format_date(date)],
        )?;
        Ok(())
    }

    pub fn registry_entry(&self, symbol: &str) -> Result<Option<RegistryEntry>, StoreError> {
        let ticker = normalize_symbol(symbol)?;
        let row: Option<(String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT Ticker, Last_updated FROM Summary WHERE Ticker = ?1",
                params![ticker],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        row.map(to_entry).transpose()
    }

    /// All registered symbols, sorted by ticker.
    pub fn list_symbols(&self) -> Result<Vec<RegistryEntry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT Ticker, Last_updated FROM Summary ORDER BY Ticker")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(to_entry(row?)?);
        }
        Ok(entries)
    }
}

fn to_entry((symbol, last_updated): (String, Option<String>)) -> Result<RegistryEntry, StoreError> {
    Ok(RegistryEntry {
        symbol,
        last_updated: last_updated.as_deref().map(parse_date).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    #[test]
    fn upsert_overwrites() {
        let store = PriceStore::open_in_memory().unwrap();
        store.upsert_registry("xom", d(1, 2)).unwrap();
        store.upsert_registry("XOM", d(3, 4)).unwrap();

        let entry = store.registry_entry("XOM").unwrap().unwrap();
        assert_eq!(entry.last_updated, Some(d(3, 4)));
        assert_eq!(store.list_symbols().unwrap().len(), 1);
    }

    #[test]
    fn list_is_sorted() {
        let store = PriceStore::open_in_memory().unwrap();
        for sym in ["TSLA", "FSLR", "XOM"] {
            store.upsert_registry(sym, d(1, 2)).unwrap();
        }
        let symbols: Vec<String> = store
            .list_symbols()
            .unwrap()
            .into_iter()
            .map(|e| e.symbol)
            .collect();
        assert_eq!(symbols, vec!["FSLR", "TSLA", "XOM"]);
    }

    #[test]
    fn unknown_symbol_has_no_entry() {
        let store = PriceStore::open_in_memory().unwrap();
        assert_eq!(store.registry_entry("ICLN").unwrap(), None);
    }
}
