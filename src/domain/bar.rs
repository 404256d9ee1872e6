//! Historical price bar.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::ReplayError;

/// One OHLC observation. `time` is unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    /// ISO-8601 UTC timestamp with millisecond precision, e.g. `2024-01-02T14:30:00.000Z`.
    /// Falls back to the raw seconds when out of chrono's range.
    pub fn iso_time(&self) -> String {
        match DateTime::<Utc>::from_timestamp(self.time, 0) {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            None => self.time.to_string(),
        }
    }
}

/// Rejects empty input, non-finite prices and timestamps that are not
/// strictly increasing.
pub fn validate_bars(bars: &[Bar]) -> Result<(), ReplayError> {
    if bars.is_empty() {
        return Err(ReplayError::NoBars);
    }
    for (i, bar) in bars.iter().enumerate() {
        let prices = [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ];
        if let Some((name, value)) = prices.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ReplayError::BarSource {
                reason: format!("bar {i} has non-finite {name} {value}"),
            });
        }
    }
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].time <= pair[0].time {
            return Err(ReplayError::BarSource {
                reason: format!(
                    "bar {} has time {} which does not follow {}",
                    i + 1,
                    pair[1].time,
                    pair[0].time
                ),
            });
        }
    }
    Ok(())
}

/// The most recent `len` bars ending at and including `cursor`.
pub fn recent_window(bars: &[Bar], cursor: usize, len: usize) -> &[Bar] {
    if bars.is_empty() || len == 0 {
        return &[];
    }
    let end = cursor.min(bars.len() - 1);
    let start = (end + 1).saturating_sub(len);
    &bars[start..=end]
}
