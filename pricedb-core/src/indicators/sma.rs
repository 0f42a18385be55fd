//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let period = self.period;
        let mut result = vec![f64::NAN; n];

        if n < period {
            return result;
        }

        let mut sum: f64 = closes[..period].iter().sum();
        let mut nan_in_window = closes[..period].iter().any(|c| c.is_nan());
        if !nan_in_window {
            result[period - 1] = sum / period as f64;
        }

        for i in period..n {
            let leaving = closes[i - period];
            let entering = closes[i];

            // A NaN poisons the running sum; rescan the window instead.
            if entering.is_nan() || leaving.is_nan() || nan_in_window {
                let window = &closes[(i + 1 - period)..=i];
                nan_in_window = window.iter().any(|c| c.is_nan());
                sum = window.iter().sum();
                if nan_in_window {
                    continue;
                }
            } else {
                sum = sum - leaving + entering;
            }

            result[i] = sum / period as f64;
        }

        result
    }
}
