//! Technical indicator implementations.
//!
//! Every calculation takes a bar prefix and recomputes from scratch, so the
//! same prefix always yields the same series. Points are only emitted where
//! the recurrence is defined; short input yields an empty series rather than
//! an error.
//!
//! - `IndicatorPoint`: a single `{ time, value }` point
//! - `StudyKind`: the overlays the replay engine can toggle

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;

pub use bollinger::{calculate_bollinger, BollingerBands};
pub use ema::calculate_ema;
pub use macd::{calculate_macd, calculate_macd_default, MacdSeries};
pub use rsi::calculate_rsi;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::ReplayError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub time: i64,
    pub value: f64,
}

/// Studies that can be switched on and off during a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyKind {
    Rsi,
    Bollinger,
    Macd,
}

impl StudyKind {
    pub const ALL: [StudyKind; 3] = [StudyKind::Rsi, StudyKind::Bollinger, StudyKind::Macd];
}

impl fmt::Display for StudyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudyKind::Rsi => write!(f, "RSI"),
            StudyKind::Bollinger => write!(f, "BB"),
            StudyKind::Macd => write!(f, "MACD"),
        }
    }
}

impl FromStr for StudyKind {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rsi" => Ok(StudyKind::Rsi),
            "bb" | "bollinger" => Ok(StudyKind::Bollinger),
            "macd" => Ok(StudyKind::Macd),
            other => Err(ReplayError::invalid(
                "study",
                format!("unknown study '{other}' (expected rsi, bb or macd)"),
            )),
        }
    }
}

/// Pair each value with the time of the bar it belongs to, starting at `offset`.
pub(crate) fn stamp(times: &[i64], offset: usize, values: &[f64]) -> Vec<IndicatorPoint> {
    let times = times.get(offset..).unwrap_or(&[]);
    values
        .iter()
        .zip(times)
        .map(|(&value, &time)| IndicatorPoint { time, value })
        .collect()
}
