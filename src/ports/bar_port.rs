//! Bar source port trait.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::domain::bar::Bar;
use crate::domain::error::ReplayError;

/// Loads the full bar sequence once. Implementations return bars in file
/// order; ordering is checked by the engine.
pub trait BarPort {
    fn load_bars(&self) -> Result<Vec<Bar>, ReplayError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarFormat {
    Json,
    Csv,
}

impl BarFormat {
    /// `.csv` files are CSV, anything else is JSON.
    pub fn infer(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => BarFormat::Csv,
            _ => BarFormat::Json,
        }
    }
}

impl fmt::Display for BarFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarFormat::Json => write!(f, "json"),
            BarFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for BarFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(BarFormat::Json),
            "csv" => Ok(BarFormat::Csv),
            other => Err(format!("unknown bar format '{other}' (expected json or csv)")),
        }
    }
}
