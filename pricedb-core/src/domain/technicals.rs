//! TechnicalRow: one row of a symbol's derived indicator series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Indicator values for a single date.
///
/// `None` marks a warmup value (window not yet full). Column names in the
/// store follow the field order here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalRow {
    pub date: NaiveDate,
    pub close_price: f64,
    pub one_m_volatility: Option<f64>,
    pub three_m_volatility: Option<f64>,
    pub twelve_sma: Option<f64>,
    pub twenty_six_sma: Option<f64>,
    pub fifty_sma: Option<f64>,
    pub two_hundred_sma: Option<f64>,
    pub twelve_ema: Option<f64>,
    pub twenty_six_ema: Option<f64>,
    pub fifty_ema: Option<f64>,
    pub two_hundred_ema: Option<f64>,
    pub macd: Option<f64>,
    pub rsi: Option<f64>,
}

impl TechnicalRow {
    /// Stored column names, in order, after `Date`.
    pub const VALUE_COLUMNS: [&'static str; 13] = [
        "Close_Price",
        "One_M_Volatility",
        "Three_M_Volatility",
        "Twelve_SMA",
        "Twenty_Six_SMA",
        "Fifty_SMA",
        "Two_Hundred_SMA",
        "Twelve_EMA",
        "Twenty_Six_EMA",
        "Fifty_EMA",
        "Two_Hundred_EMA",
        "MACD",
        "RSI",
    ];

    /// Values in `VALUE_COLUMNS` order.
    pub fn values(&self) -> [Option<f64>; 13] {
        [
            Some(self.close_price),
            self.one_m_volatility,
            self.three_m_volatility,
            self.twelve_sma,
            self.twenty_six_sma,
            self.fifty_sma,
            self.two_hundred_sma,
            self.twelve_ema,
            self.twenty_six_ema,
            self.fifty_ema,
            self.two_hundred_ema,
            self.macd,
            self.rsi,
        ]
    }
}
