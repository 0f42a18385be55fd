//! SQLite price store.
//!
//! Owns the long-lived connection and the three tables: the symbol registry
//! (`Summary`), the price series (`timeseries`) and the derived indicator
//! series (`technicals`). Multi-row writes run inside one transaction, so a
//! failed write leaves the previous rows in place.

mod prices;
mod registry;
pub mod schema;
mod technicals;

use crate::domain::{normalize_symbol, SymbolError, DATE_FORMAT};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use registry::RegistryEntry;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An append hit a date that is already stored for the symbol. Usually a
    /// provider window that overlaps stored rows or a bar stamped on a
    /// non-trading day.
    #[error("date conflict for {symbol}: {date} is already stored")]
    DateConflict { symbol: String, date: NaiveDate },

    #[error("no price data stored for '{symbol}'")]
    NoPriceData { symbol: String },

    #[error("invalid symbol: {0}")]
    InvalidSymbol(#[from] SymbolError),

    #[error("invalid stored date '{0}'")]
    InvalidDate(String),

    #[error("create database directory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("frame error: {0}")]
    Frame(String),
}

/// How `write_bars` treats rows already stored for the symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Insert alongside existing rows; a duplicate date is a `DateConflict`.
    Append,
    /// Swap the whole series for `bars`.
    Replace,
}

pub struct PriceStore {
    conn: Connection,
}

impl PriceStore {
    /// Open (or create) a database file and make sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Create the registry table (and the shared series tables) if absent.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(schema::CREATE_REGISTRY)?;
        self.conn.execute_batch(schema::CREATE_PRICES)?;
        self.conn.execute_batch(schema::CREATE_TECHNICALS)?;
        Ok(())
    }

    /// Make sure `symbol` can hold a price series.
    ///
    /// Series share the `timeseries` table, so this validates the symbol and
    /// re-asserts that table; it never creates per-symbol DDL.
    pub fn ensure_symbol_table(&self, symbol: &str) -> Result<(), StoreError> {
        normalize_symbol(symbol)?;
        self.conn.execute_batch(schema::CREATE_PRICES)?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| StoreError::InvalidDate(s.to_string()))
}

/// NaN is stored as NULL.
pub(crate) fn nullable(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let store = PriceStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();
        store.ensure_symbol_table("XOM").unwrap();
        store.ensure_symbol_table("XOM").unwrap();
    }

    #[test]
    fn ensure_symbol_table_rejects_bad_symbol() {
        let store = PriceStore::open_in_memory().unwrap();
        assert!(matches!(
            store.ensure_symbol_table("X; DROP TABLE Summary"),
            Err(StoreError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn dates_round_trip_exactly() {
        for s in ["1962-01-02", "2000-02-29", "2024-12-31"] {
            assert_eq!(format_date(parse_date(s).unwrap()), s);
        }
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("02/01/2024").is_err());
    }

    #[test]
    fn open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/prices.sqlite");
        PriceStore::open(&path).unwrap();
        assert!(path.exists());
    }
}
