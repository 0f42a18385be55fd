//! Annualized close-to-close volatility.
//!
//! Sample standard deviation (n - 1) of daily percentage returns over a
//! trailing `window`, scaled by `sqrt(trading_days_per_year)`.
//!
//! The first return is undefined, so a full window of returns first exists
//! at row `window`. Row `window - 1` is reported from its `window - 1`
//! returns. Lookback: window - 1.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Volatility {
    window: usize,
    annualization: f64,
    name: String,
}

impl Volatility {
    pub fn new(window: usize, trading_days_per_year: f64) -> Self {
        assert!(window >= 3, "volatility window must be >= 3");
        Self {
            window,
            annualization: trading_days_per_year.sqrt(),
            name: format!("volatility_{window}"),
        }
    }
}

/// `r[t] = close[t] / close[t-1] - 1`; `r[0]` is NaN.
pub fn pct_change(closes: &[f64]) -> Vec<f64> {
    let mut returns = vec![f64::NAN; closes.len()];
    for i in 1..closes.len() {
        returns[i] = closes[i] / closes[i - 1] - 1.0;
    }
    returns
}

/// Sample standard deviation of the non-NaN values in `window`, or NaN when
/// fewer than `min_obs` are present.
fn sample_std(window: &[f64], min_obs: usize) -> f64 {
    let obs = || window.iter().copied().filter(|v| !v.is_nan());
    let count = obs().count();
    if count < min_obs.max(2) {
        return f64::NAN;
    }
    let mean = obs().sum::<f64>() / count as f64;
    let ss: f64 = obs().map(|v| (v - mean) * (v - mean)).sum();
    (ss / (count - 1) as f64).sqrt()
}

impl Indicator for Volatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let returns = pct_change(closes);
        (0..returns.len())
            .map(|i| {
                let start = (i + 1).saturating_sub(self.window);
                sample_std(&returns[start..=i], self.window - 1) * self.annualization
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn pct_change_basic() {
        let r = pct_change(&[100.0, 110.0, 99.0]);
        assert!(r[0].is_nan());
        assert_approx(r[1], 0.1, DEFAULT_EPSILON);
        assert_approx(r[2], -0.1, DEFAULT_EPSILON);
    }

    #[test]
    fn constant_growth_has_zero_volatility() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let result = Volatility::new(21, 252.0).compute(&closes);
        assert!(result[..20].iter().all(|v| v.is_nan()));
        for v in &result[20..] {
            assert_approx(*v, 0.0, 1e-12);
        }
    }

    #[test]
    fn alternating_returns_hand_computed() {
        // returns alternate +10% / -10%: window of 4 returns has mean 0,
        // sample variance 4 * 0.01 / 3
        let mut closes = vec![100.0];
        for i in 0..8 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last * 1.1 } else { last * 0.9 });
        }
        let result = Volatility::new(4, 252.0).compute(&closes);
        let expected = (0.04_f64 / 3.0).sqrt() * 252.0_f64.sqrt();
        assert_approx(result[8], expected, 1e-9);
    }

    #[test]
    fn full_window_ignores_older_returns() {
        let mut closes: Vec<f64> = vec![100.0, 150.0, 60.0];
        closes.extend(std::iter::repeat(60.0).take(30));
        let result = Volatility::new(5, 252.0).compute(&closes);
        // by the end the window only holds flat returns
        assert_approx(*result.last().unwrap(), 0.0, DEFAULT_EPSILON);
    }
}
