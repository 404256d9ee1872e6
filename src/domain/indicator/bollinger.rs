//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! One point per band for every window ending at index >= period-1.

use serde::Serialize;

use crate::domain::bar::Bar;
use crate::domain::indicator::IndicatorPoint;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_STDDEV_MULT: f64 = 2.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BollingerBands {
    pub upper: Vec<IndicatorPoint>,
    pub middle: Vec<IndicatorPoint>,
    pub lower: Vec<IndicatorPoint>,
}

impl BollingerBands {
    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }
}

pub fn calculate_bollinger(bars: &[Bar], period: usize, stddev_mult: f64) -> BollingerBands {
    if period == 0 || bars.len() < period {
        return BollingerBands::default();
    }

    let count = bars.len() - period + 1;
    let mut bands = BollingerBands {
        upper: Vec::with_capacity(count),
        middle: Vec::with_capacity(count),
        lower: Vec::with_capacity(count),
    };

    for (offset, window) in bars.windows(period).enumerate() {
        let time = bars[offset + period - 1].time;
        let mean: f64 = window.iter().map(|b| b.close).sum::<f64>() / period as f64;

        let variance: f64 = window
            .iter()
            .map(|b| {
                let diff = b.close - mean;
                diff * diff
            })
            .sum::<f64>()
            / period as f64;

        let width = stddev_mult * variance.sqrt();
        bands.upper.push(IndicatorPoint {
            time,
            value: mean + width,
        });
        bands.middle.push(IndicatorPoint { time, value: mean });
        bands.lower.push(IndicatorPoint {
            time,
            value: mean - width,
        });
    }

    bands
}
