//! JSON bar file adapter: a single array of `{ time, open, high, low, close }`.

use std::fs;
use std::path::PathBuf;

use crate::domain::bar::Bar;
use crate::domain::error::ReplayError;
use crate::ports::bar_port::BarPort;

pub struct JsonBarAdapter {
    path: PathBuf,
}

impl JsonBarAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl BarPort for JsonBarAdapter {
    fn load_bars(&self) -> Result<Vec<Bar>, ReplayError> {
        let content = fs::read_to_string(&self.path).map_err(|e| ReplayError::BarSource {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        serde_json::from_str(&content).map_err(|e| ReplayError::BarSource {
            reason: format!("{}: {}", self.path.display(), e),
        })
    }
}
