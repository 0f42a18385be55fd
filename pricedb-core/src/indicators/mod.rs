//! Indicator engine.
//!
//! Indicators are pure functions over a close-price series: closes in, one
//! value per row out. Warmup rows are `f64::NAN` and become `None` (SQL NULL)
//! when assembled into `TechnicalRow`s.
//!
//! Exponential smoothing is the adjusted form: weights are renormalized over
//! the observations seen so far rather than seeded from a simple average.

pub mod ema;
pub mod rsi;
pub mod sma;
pub mod technicals;
pub mod volatility;

pub use ema::{ewm_mean, Ema};
pub use rsi::Rsi;
pub use sma::Sma;
pub use technicals::{compute_indicators, update_indicators};
pub use volatility::Volatility;

/// A close-series indicator.
///
/// `compute` returns a vector the same length as `closes`; the first
/// `lookback()` values are `f64::NAN`.
///
/// No value at row t may depend on closes after row t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_12", "rsi_14").
    fn name(&self) -> &str;

    /// Rows needed before the indicator produces a value.
    fn lookback(&self) -> usize;

    fn compute(&self, closes: &[f64]) -> Vec<f64>;
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
