//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow), trimmed to start at index slow-1
//! Signal Line = EMA(signal) of the trimmed MACD Line, first signal-1 points dropped
//! Histogram = MACD Line - Signal Line, at every time both exist
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Needs at least `slow` bars. The signal line and histogram start at
//! index slow-1 + signal-1.

use serde::Serialize;

use crate::domain::bar::Bar;
use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{stamp, IndicatorPoint};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MacdSeries {
    pub macd: Vec<IndicatorPoint>,
    pub signal: Vec<IndicatorPoint>,
    pub histogram: Vec<IndicatorPoint>,
}

impl MacdSeries {
    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }
}

pub fn calculate_macd(
    bars: &[Bar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    if fast == 0 || slow == 0 || signal_period == 0 || bars.len() < slow {
        return MacdSeries::default();
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let times: Vec<i64> = bars.iter().map(|b| b.time).collect();

    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);

    let macd_start = slow - 1;
    let macd_line: Vec<f64> = ema_fast[macd_start..]
        .iter()
        .zip(&ema_slow[macd_start..])
        .map(|(f, s)| f - s)
        .collect();

    let signal_skip = signal_period - 1;
    let signal_line: Vec<f64> = ema_values(&macd_line, signal_period)
        .into_iter()
        .skip(signal_skip)
        .collect();

    let macd = stamp(&times, macd_start, &macd_line);
    let signal = stamp(&times, macd_start + signal_skip, &signal_line);
    let histogram = align_histogram(&macd, &signal);

    MacdSeries {
        macd,
        signal,
        histogram,
    }
}

pub fn calculate_macd_default(bars: &[Bar]) -> MacdSeries {
    calculate_macd(bars, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

/// MACD minus signal, matched by timestamp rather than by array position.
fn align_histogram(macd: &[IndicatorPoint], signal: &[IndicatorPoint]) -> Vec<IndicatorPoint> {
    let mut histogram = Vec::with_capacity(signal.len());
    let mut m = 0;
    for s in signal {
        while m < macd.len() && macd[m].time < s.time {
            m += 1;
        }
        if let Some(point) = macd.get(m).filter(|p| p.time == s.time) {
            histogram.push(IndicatorPoint {
                time: s.time,
                value: point.value - s.value,
            });
        }
    }
    histogram
}
