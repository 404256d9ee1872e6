//! RSI (Relative Strength Index) indicator.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n deltas
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100 when avg_gain > 0, otherwise 50.
//!
//! Needs more than n bars. The first point is at index n+1, so a prefix of
//! length L yields max(0, L - n - 1) points.

use crate::domain::bar::Bar;
use crate::domain::indicator::IndicatorPoint;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(bars: &[Bar], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || bars.len() <= period {
        return Vec::new();
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in 1..=period {
        let change = bars[i].close - bars[i - 1].close;
        if change >= 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let n = period as f64;
    let mut avg_gain = gains / n;
    let mut avg_loss = losses / n;
    let mut values = Vec::with_capacity(bars.len() - period - 1);

    for i in (period + 1)..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        avg_gain = (avg_gain * (n - 1.0) + change.max(0.0)) / n;
        avg_loss = (avg_loss * (n - 1.0) + (-change).max(0.0)) / n;
        values.push(IndicatorPoint {
            time: bars[i].time,
            value: rsi_from_averages(avg_gain, avg_loss),
        });
    }

    values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 { 100.0 } else { 50.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
