//! JSON-lines frame log for an external chart.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::error::ReplayError;
use crate::domain::replay::Frame;
use crate::ports::render_port::RenderSink;

pub struct JsonFrameSink<W: Write> {
    writer: W,
}

impl JsonFrameSink<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self, ReplayError> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> JsonFrameSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSink for JsonFrameSink<W> {
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), ReplayError> {
        serde_json::to_writer(&mut self.writer, frame).map_err(std::io::Error::from)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use crate::domain::indicator::StudyKind;
    use crate::domain::replay::{ReplayConfig, ReplayEngine};

    #[test]
    fn one_line_per_frame() {
        let bars = (0..30)
            .map(|i| Bar {
                time: i * 60,
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.0 + (i % 3) as f64,
            })
            .collect();
        let mut engine = ReplayEngine::new(bars, ReplayConfig::default()).unwrap();
        let mut sink = JsonFrameSink::new(Vec::new());

        sink.render(&engine.frame()).unwrap();
        for _ in 0..24 {
            engine.advance();
        }
        engine.toggle_study(StudyKind::Macd, false);
        sink.render(&engine.frame()).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["bars"].as_array().unwrap().len(), 1);
        assert_eq!(lines[1]["cursor"], 24);
        assert_eq!(lines[1]["bars"].as_array().unwrap().len(), 25);
        assert_eq!(lines[1]["studies"]["rsi"].as_array().unwrap().len(), 25 - 15);
        assert!(lines[1]["studies"]["macd"]["macd"].as_array().unwrap().is_empty());
        assert_eq!(lines[1]["enabled"]["macd"], false);
    }
}
