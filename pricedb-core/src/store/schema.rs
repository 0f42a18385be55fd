//! Table definitions.
//!
//! Prices and technicals live in two generic tables keyed by `(Ticker, Date)`
//! rather than one table per symbol, so no DDL is ever built from user input.
//! Dates are `YYYY-MM-DD` text, which sorts chronologically.

pub const REGISTRY_TABLE: &str = "Summary";
pub const PRICES_TABLE: &str = "timeseries";
pub const TECHNICALS_TABLE: &str = "technicals";

/// Suffixes of the per-symbol logical table names (`XOM_timeseries`).
pub const PRICES_SUFFIX: &str = "_timeseries";
pub const TECHNICALS_SUFFIX: &str = "_technicals";

pub const CREATE_REGISTRY: &str = "
CREATE TABLE IF NOT EXISTS Summary (
    Ticker       TEXT PRIMARY KEY,
    Last_updated TEXT
);";

pub const CREATE_PRICES: &str = "
CREATE TABLE IF NOT EXISTS timeseries (
    Ticker       TEXT NOT NULL,
    Date         TEXT NOT NULL,
    Open         REAL,
    High         REAL,
    Low          REAL,
    Close        REAL,
    Volume       INTEGER,
    Dividends    REAL,
    Stock_Splits REAL,
    PRIMARY KEY (Ticker, Date)
);
CREATE INDEX IF NOT EXISTS idx_timeseries_date ON timeseries (Date);";

pub const CREATE_TECHNICALS: &str = "
CREATE TABLE IF NOT EXISTS technicals (
    Ticker             TEXT NOT NULL,
    Date               TEXT NOT NULL,
    Close_Price        REAL,
    One_M_Volatility   REAL,
    Three_M_Volatility REAL,
    Twelve_SMA         REAL,
    Twenty_Six_SMA     REAL,
    Fifty_SMA          REAL,
    Two_Hundred_SMA    REAL,
    Twelve_EMA         REAL,
    Twenty_Six_EMA     REAL,
    Fifty_EMA          REAL,
    Two_Hundred_EMA    REAL,
    MACD               REAL,
    RSI                REAL,
    PRIMARY KEY (Ticker, Date)
);
CREATE INDEX IF NOT EXISTS idx_technicals_date ON technicals (Date);";

pub const PRICE_COLUMNS: [&str; 8] = [
    "Date",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Dividends",
    "Stock_Splits",
];

pub const INSERT_BAR: &str = "
INSERT INTO timeseries
    (Ticker, Date, Open, High, Low, Close, Volume, Dividends, Stock_Splits)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

pub const SELECT_BARS: &str = "
SELECT Date, Open, High, Low, Close, Volume, Dividends, Stock_Splits
FROM timeseries
WHERE Ticker = ?1
  AND (?2 IS NULL OR Date >= ?2)
  AND (?3 IS NULL OR Date <= ?3)
ORDER BY Date";

pub const INSERT_TECHNICAL: &str = "
INSERT INTO technicals
    (Ticker, Date, Close_Price, One_M_Volatility, Three_M_Volatility,
     Twelve_SMA, Twenty_Six_SMA, Fifty_SMA, Two_Hundred_SMA,
     Twelve_EMA, Twenty_Six_EMA, Fifty_EMA, Two_Hundred_EMA, MACD, RSI)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)";

pub const SELECT_TECHNICALS: &str = "
SELECT Date, Close_Price, One_M_Volatility, Three_M_Volatility,
       Twelve_SMA, Twenty_Six_SMA, Fifty_SMA, Two_Hundred_SMA,
       Twelve_EMA, Twenty_Six_EMA, Fifty_EMA, Two_Hundred_EMA, MACD, RSI
FROM technicals
WHERE Ticker = ?1
  AND (?2 IS NULL OR Date >= ?2)
  AND (?3 IS NULL OR Date <= ?3)
ORDER BY Date";
