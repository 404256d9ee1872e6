//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! One value per input bar, the seed included; callers that need a warm-up
//! discard the leading points themselves.

use crate::domain::bar::Bar;
use crate::domain::indicator::{stamp, IndicatorPoint};

pub fn calculate_ema(bars: &[Bar], period: usize) -> Vec<IndicatorPoint> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let times: Vec<i64> = bars.iter().map(|b| b.time).collect();
    stamp(&times, 0, &ema_values(&closes, period))
}

/// Raw EMA recurrence over a value sequence.
pub(crate) fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    let Some(&seed) = values.first() else {
        return Vec::new();
    };
    if period == 0 {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = seed;
    out.push(ema);

    for &value in &values[1..] {
        // Same as value*k + ema*(1-k); a flat input stays exactly flat.
        ema += k * (value - ema);
        out.push(ema);
    }
    out
}
