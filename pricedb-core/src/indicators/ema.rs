//! Exponential Moving Average (EMA).
//!
//! Adjusted exponentially-weighted mean: row t is the weighted average of all
//! observations so far with weights (1 - alpha)^k. Defined from the first
//! row; early values lean on fewer observations and converge to the
//! steady-state recursion `EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1]`.
//! Lookback: 0.

use super::Indicator;

/// Smoothing factor for a span: `2 / (span + 1)`.
pub fn alpha_from_span(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Smoothing factor for a center of mass: `1 / (1 + com)`.
pub fn alpha_from_com(com: f64) -> f64 {
    1.0 / (1.0 + com)
}

/// Adjusted exponentially-weighted mean of `values`.
///
/// NaN inputs are skipped but still age the existing weights. A row is
/// reported once at least `min_periods` (and at least one) observations have
/// been seen; before that it is NaN.
pub fn ewm_mean(values: &[f64], alpha: f64, min_periods: usize) -> Vec<f64> {
    let min_periods = min_periods.max(1);
    let decay = 1.0 - alpha;
    let mut result = vec![f64::NAN; values.len()];

    let mut weighted = f64::NAN;
    let mut old_wt = 1.0;
    let mut nobs = 0usize;

    for (i, &x) in values.iter().enumerate() {
        let is_obs = !x.is_nan();
        if is_obs {
            nobs += 1;
        }

        if weighted.is_nan() {
            if is_obs {
                weighted = x;
            }
        } else {
            old_wt *= decay;
            if is_obs {
                if weighted != x {
                    weighted = (old_wt * weighted + x) / (old_wt + 1.0);
                }
                old_wt += 1.0;
            }
        }

        if nobs >= min_periods {
            result[i] = weighted;
        }
    }

    result
}

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn from_span(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            name: format!("ema_{span}"),
        }
    }

    pub fn alpha(&self) -> f64 {
        alpha_from_span(self.span)
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        ewm_mean(closes, self.alpha(), 0)
    }
}
