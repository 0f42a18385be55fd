//! Relative Strength Index (RSI).
//!
//! Day-over-day differences are split into an up series (positive moves,
//! zero otherwise) and a down series (negative moves, zero otherwise). Each
//! is smoothed with an adjusted exponentially-weighted mean with center of
//! mass `period - 1` and a `period`-observation floor.
//!
//! RSI = 100 - 100 / (1 + |up_avg / down_avg|)
//! Lookback: period.
//! A flat window (both averages zero) has no RSI.

use super::ema::{alpha_from_com, ewm_mean};
use super::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "RSI period must be >= 2");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut up = vec![f64::NAN; n];
        let mut down = vec![f64::NAN; n];
        for i in 1..n {
            let diff = closes[i] - closes[i - 1];
            // NaN diffs stay NaN in both legs
            up[i] = if diff < 0.0 { 0.0 } else { diff };
            down[i] = if diff > 0.0 { 0.0 } else { diff };
        }

        let alpha = alpha_from_com((self.period - 1) as f64);
        let up_avg = ewm_mean(&up, alpha, self.period);
        let down_avg = ewm_mean(&down, alpha, self.period);

        up_avg
            .iter()
            .zip(&down_avg)
            .map(|(u, d)| 100.0 - 100.0 / (1.0 + (u / d).abs()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let result = Rsi::new(14).compute(&closes);
        assert!(result[..14].iter().all(|v| v.is_nan()));
        for v in &result[14..] {
            assert_approx(*v, 100.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let result = Rsi::new(14).compute(&closes);
        for v in &result[14..] {
            assert_approx(*v, 0.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rsi_flat_series_is_undefined() {
        let result = Rsi::new(14).compute(&[50.0; 30]);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_alternating_moves_near_50() {
        let closes: Vec<f64> = (0..200)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let result = Rsi::new(14).compute(&closes);
        let last = result[199];
        assert!((45.0..=55.0).contains(&last), "rsi={last}");
    }

    #[test]
    fn rsi_two_step_hand_computed() {
        // period 2 -> alpha 0.5; diffs: +2, -1
        let result = Rsi::new(2).compute(&[10.0, 12.0, 11.0]);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        // up: (0.5 * 2 + 0) / 1.5, down: (0.5 * 0 - 1) / 1.5
        let rs: f64 = (1.0_f64 / 1.5) / (1.0 / 1.5);
        assert_approx(result[2], 100.0 - 100.0 / (1.0 + rs), DEFAULT_EPSILON);
    }
}
