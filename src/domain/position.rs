//! Trade actions, entry markers and PnL.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::ReplayError;

/// What the user chose at a bar. `None` is a skip: no position is held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    #[default]
    None,
    Long,
    Short,
}

impl Action {
    pub fn side(self) -> Option<Side> {
        match self {
            Action::Long => Some(Side::Long),
            Action::Short => Some(Side::Short),
            Action::None => None,
        }
    }

    pub fn is_open(self) -> bool {
        self != Action::None
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::None => write!(f, "NONE"),
            Action::Long => write!(f, "LONG"),
            Action::Short => write!(f, "SHORT"),
        }
    }
}

impl FromStr for Action {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" => Ok(Action::Long),
            "SHORT" => Ok(Action::Short),
            "NONE" | "SKIP" => Ok(Action::None),
            other => Err(ReplayError::invalid(
                "action",
                format!("'{other}' is not LONG, SHORT or NONE"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarkerKind {
    Entry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeMarker {
    pub time: i64,
    pub side: Side,
    pub kind: MarkerKind,
}

impl TradeMarker {
    pub fn entry(time: i64, side: Side) -> Self {
        Self {
            time,
            side,
            kind: MarkerKind::Entry,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Pnl {
    pub unit: f64,
    pub total: f64,
    pub percent: f64,
}

impl Pnl {
    /// Mark a position at `price`. Percent is 0 when `entry_price * trade_size` is 0.
    pub fn compute(position: Action, entry_price: f64, price: f64, trade_size: f64) -> Self {
        let diff = price - entry_price;
        let unit = match position {
            Action::Long => diff,
            Action::Short => -diff,
            Action::None => 0.0,
        };
        let total = unit * trade_size;
        let notional = entry_price * trade_size;
        let percent = if notional != 0.0 {
            total / notional * 100.0
        } else {
            0.0
        };
        Self {
            unit,
            total,
            percent,
        }
    }
}
