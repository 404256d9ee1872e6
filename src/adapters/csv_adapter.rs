//! CSV bar file adapter.
//!
//! Expects a header row followed by `time,open,high,low,close` columns. Any
//! further columns (volume, etc.) are ignored. `time` is unix seconds or an
//! RFC 3339 timestamp.

use chrono::DateTime;
use std::fs;
use std::path::PathBuf;

use crate::domain::bar::Bar;
use crate::domain::error::ReplayError;
use crate::ports::bar_port::BarPort;

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn bar_error(reason: String) -> ReplayError {
    ReplayError::BarSource { reason }
}

fn parse_time(value: &str) -> Result<i64, ReplayError> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<i64>() {
        return Ok(secs);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp())
        .map_err(|e| bar_error(format!("invalid time '{value}': {e}")))
}

fn parse_price(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, ReplayError> {
    let raw = record
        .get(index)
        .ok_or_else(|| bar_error(format!("missing {name} column")))?;
    raw.trim()
        .parse()
        .map_err(|e| bar_error(format!("invalid {name} value '{raw}': {e}")))
}

impl BarPort for CsvAdapter {
    fn load_bars(&self) -> Result<Vec<Bar>, ReplayError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            bar_error(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| bar_error(format!("CSV parse error: {e}")))?;

            let time = parse_time(
                record
                    .get(0)
                    .ok_or_else(|| bar_error("missing time column".into()))?,
            )?;

            bars.push(Bar {
                time,
                open: parse_price(&record, 1, "open")?,
                high: parse_price(&record, 2, "high")?,
                low: parse_price(&record, 3, "low")?,
                close: parse_price(&record, 4, "close")?,
            });
        }

        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_csv(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bars.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn load_bars_returns_rows_in_order() {
        let (_dir, path) = write_csv(
            "time,open,high,low,close,volume\n\
             1704205800,4750.0,4755.5,4748.25,4752.0,1200\n\
             1704206100,4752.0,4760.0,4751.0,4759.75,900\n",
        );
        let bars = CsvAdapter::new(path).load_bars().unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].time, 1_704_205_800);
        assert_eq!(bars[0].open, 4750.0);
        assert_eq!(bars[0].high, 4755.5);
        assert_eq!(bars[0].low, 4748.25);
        assert_eq!(bars[1].close, 4759.75);
    }

    #[test]
    fn load_bars_accepts_rfc3339_time() {
        let (_dir, path) = write_csv(
            "time,open,high,low,close\n2024-01-02T14:30:00Z,1,2,0.5,1.5\n",
        );
        let bars = CsvAdapter::new(path).load_bars().unwrap();
        assert_eq!(bars[0].time, 1_704_205_800);
    }

    #[test]
    fn load_bars_rejects_bad_price() {
        let (_dir, path) = write_csv("time,open,high,low,close\n1,1,2,x,1.5\n");
        let err = CsvAdapter::new(path).load_bars().unwrap_err();
        assert!(err.to_string().contains("invalid low value"));
    }

    #[test]
    fn non_finite_rows_fail_validation() {
        use crate::domain::bar::validate_bars;

        for row in ["2,NaN,2,0.5,1.5", "2,1,inf,0.5,1.5", "2,1,2,-inf,1.5"] {
            let (_dir, path) = write_csv(&format!(
                "time,open,high,low,close\n1,1,2,0.5,1.5\n{row}\n"
            ));
            let bars = CsvAdapter::new(path).load_bars().unwrap();
            assert!(
                matches!(validate_bars(&bars), Err(ReplayError::BarSource { .. })),
                "{row} should be rejected"
            );
        }
    }

    #[test]
    fn load_bars_rejects_short_row() {
        let (_dir, path) = write_csv("time,open,high,low,close\n1,1,2,0.5\n");
        assert!(matches!(
            CsvAdapter::new(path).load_bars(),
            Err(ReplayError::BarSource { .. })
        ));
    }

    #[test]
    fn load_bars_missing_file() {
        let adapter = CsvAdapter::new(PathBuf::from("/nonexistent/bars.csv"));
        assert!(matches!(
            adapter.load_bars(),
            Err(ReplayError::BarSource { .. })
        ));
    }

    #[test]
    fn header_only_is_empty() {
        let (_dir, path) = write_csv("time,open,high,low,close\n");
        assert!(CsvAdapter::new(path).load_bars().unwrap().is_empty());
    }
}
