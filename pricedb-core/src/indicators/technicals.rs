//! Assembly of the technicals table from a price series.

use super::{Ema, Indicator, Rsi, Sma, Volatility};
use crate::config::IndicatorConfig;
use crate::domain::{Bar, DateRange, TechnicalRow};
use crate::store::{PriceStore, StoreError};
use tracing::debug;

fn defined(v: f64) -> Option<f64> {
    (!v.is_nan()).then_some(v)
}

/// Compute one `TechnicalRow` per bar.
///
/// Pure: the same bars and config always give bit-identical rows. MACD is
/// exactly `twelve_ema - twenty_six_ema` on every row.
pub fn compute_indicators(bars: &[Bar], config: &IndicatorConfig) -> Vec<TechnicalRow> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let [vol_1m, vol_3m] = config
        .volatility_windows
        .map(|w| Volatility::new(w, config.trading_days_per_year).compute(&closes));
    let [sma_12, sma_26, sma_50, sma_200] = config.sma_periods.map(|p| Sma::new(p).compute(&closes));
    let [ema_12, ema_26, ema_50, ema_200] = config.ema_spans.map(|s| Ema::from_span(s).compute(&closes));
    let rsi = Rsi::new(config.rsi_period).compute(&closes);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let twelve_ema = defined(ema_12[i]);
            let twenty_six_ema = defined(ema_26[i]);
            TechnicalRow {
                date: bar.date,
                close_price: bar.close,
                one_m_volatility: defined(vol_1m[i]),
                three_m_volatility: defined(vol_3m[i]),
                twelve_sma: defined(sma_12[i]),
                twenty_six_sma: defined(sma_26[i]),
                fifty_sma: defined(sma_50[i]),
                two_hundred_sma: defined(sma_200[i]),
                twelve_ema,
                twenty_six_ema,
                fifty_ema: defined(ema_50[i]),
                two_hundred_ema: defined(ema_200[i]),
                macd: twelve_ema.zip(twenty_six_ema).map(|(fast, slow)| fast - slow),
                rsi: defined(rsi[i]),
            }
        })
        .collect()
}

/// Regenerate the stored technicals for `symbol` from its full price series.
///
/// Fails with `NoPriceData` when nothing is stored; the previous technicals
/// are then left as they were.
pub fn update_indicators(
    store: &mut PriceStore,
    symbol: &str,
    config: &IndicatorConfig,
) -> Result<usize, StoreError> {
    let bars = store.load_bars(symbol, DateRange::all())?;
    if bars.is_empty() {
        return Err(StoreError::NoPriceData {
            symbol: symbol.to_string(),
        });
    }
    let rows = compute_indicators(&bars, config);
    let written = store.replace_technicals(symbol, &rows)?;
    debug!(symbol, rows = written, "technicals regenerated");
    Ok(written)
}
