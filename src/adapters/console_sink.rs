//! Text renderer for terminal sessions.
//!
//! Prints one status line per frame and the quiz whenever it changes.

use std::io::Write;

use crate::domain::error::ReplayError;
use crate::domain::indicator::IndicatorPoint;
use crate::domain::quiz::{QuizOutcome, QuizState};
use crate::domain::replay::Frame;
use crate::ports::render_port::RenderSink;

pub struct ConsoleSink<W: Write> {
    out: W,
    last_quiz: QuizState,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_quiz: QuizState::Idle,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn last_value(series: &[IndicatorPoint]) -> Option<f64> {
    series.last().map(|p| p.value)
}

/// Answering a quiz does not count as a new quiz.
fn same_quiz(a: &QuizState, b: &QuizState) -> bool {
    match (a, b) {
        (QuizState::Ready { quiz: x, .. }, QuizState::Ready { quiz: y, .. }) => x == y,
        _ => a == b,
    }
}

pub fn status_line(frame: &Frame<'_>) -> String {
    let close = frame.bars.last().map(|b| b.close).unwrap_or_default();
    let time = frame
        .bars
        .last()
        .map(|b| b.iso_time())
        .unwrap_or_default();

    let mut line = format!(
        "[{:>5}] {}  close {:.2}  {:?}",
        frame.cursor + 1,
        time,
        close,
        frame.playback
    );

    match (frame.position, frame.entry_price) {
        (position, Some(entry)) if position.is_open() => line.push_str(&format!(
            "  {position} {} @ {entry:.2}  pnl {:+.2} ({:+.2}%)",
            frame.trade_size, frame.pnl.total, frame.pnl.percent
        )),
        _ => line.push_str("  flat"),
    }

    if let Some(rsi) = last_value(&frame.studies.rsi) {
        line.push_str(&format!("  RSI {rsi:.1}"));
    }
    let bb = &frame.studies.bollinger;
    if let (Some(upper), Some(lower)) = (last_value(&bb.upper), last_value(&bb.lower)) {
        line.push_str(&format!("  BB {lower:.2}-{upper:.2}"));
    }
    let macd = &frame.studies.macd;
    if let Some(m) = last_value(&macd.macd) {
        line.push_str(&format!("  MACD {m:.3}"));
        if let (Some(s), Some(h)) = (last_value(&macd.signal), last_value(&macd.histogram)) {
            line.push_str(&format!("/{s:.3}/{h:+.3}"));
        }
    }
    line
}

impl<W: Write> ConsoleSink<W> {
    fn write_quiz(&mut self, quiz: &QuizState) -> Result<(), ReplayError> {
        match quiz {
            QuizState::Idle => {}
            QuizState::Pending { action, .. } => {
                writeln!(self.out, "generating quiz for {action}...")?;
            }
            QuizState::Ready { quiz, .. } => {
                writeln!(self.out, "\n{}", quiz.question)?;
                for (i, option) in quiz.options.iter().enumerate() {
                    writeln!(self.out, "  {}. {}", i + 1, option.text())?;
                }
                writeln!(self.out, "answer <1-{}> or dismiss", quiz.options.len())?;
            }
            QuizState::Failed { reason, .. } => {
                writeln!(self.out, "quiz failed: {reason}")?;
                writeln!(self.out, "retry or dismiss")?;
            }
        }
        Ok(())
    }
}

impl<W: Write> RenderSink for ConsoleSink<W> {
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), ReplayError> {
        writeln!(self.out, "{}", status_line(frame))?;
        if !same_quiz(&self.last_quiz, frame.quiz) {
            self.write_quiz(frame.quiz)?;
            self.last_quiz = frame.quiz.clone();
        }
        self.out.flush()?;
        Ok(())
    }

    fn quiz_outcome(&mut self, outcome: &QuizOutcome) -> Result<(), ReplayError> {
        let verdict = if outcome.correct { "Correct" } else { "Incorrect" };
        writeln!(self.out, "{verdict}: {}", outcome.feedback)?;
        self.out.flush()?;
        Ok(())
    }

    fn notice(&mut self, text: &str) -> Result<(), ReplayError> {
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::Action;
    use crate::domain::bar::Bar;
    use crate::domain::quiz::Quiz;
    use crate::domain::replay::{ReplayConfig, ReplayEngine};

    fn engine() -> ReplayEngine {
        let bars = (0..40)
            .map(|i| {
                let close = 100.0 + i as f64;
                Bar {
                    time: 1_704_205_800 + i * 300,
                    open: close,
                    high: close,
                    low: close,
                    close,
                }
            })
            .collect();
        ReplayEngine::new(bars, ReplayConfig::default()).unwrap()
    }

    fn output(sink: ConsoleSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn status_line_flat() {
        let e = engine();
        let line = status_line(&e.frame());
        assert!(line.contains("2024-01-02T14:30:00.000Z"));
        assert!(line.contains("close 100.00"));
        assert!(line.contains("Paused"));
        assert!(line.contains("flat"));
        assert!(!line.contains("RSI"));
    }

    #[test]
    fn status_line_with_position_and_studies() {
        let mut e = engine();
        for _ in 0..35 {
            e.advance();
        }
        e.open_trade(Action::Short);
        e.advance();
        let line = status_line(&e.frame());
        assert!(line.contains("SHORT 1 @ 135.00"));
        assert!(line.contains("pnl -1.00"));
        assert!(line.contains("RSI 100.0"));
        assert!(line.contains("BB "));
        assert!(line.contains("MACD "));
    }

    #[test]
    fn quiz_printed_once() {
        let mut e = engine();
        let mut sink = ConsoleSink::new(Vec::new());
        let dispatch = e.open_trade(Action::Long);
        sink.render(&e.frame()).unwrap();
        let quiz = Quiz::from_raw_text(
            r#"{"question":"Why long here?","options":["a","b","c"],"correctIndex":0,
                "feedback":["yes","no","no"]}"#,
        )
        .unwrap();
        e.resolve_quiz(dispatch.ticket, Ok(quiz));
        sink.render(&e.frame()).unwrap();
        let outcome = e.answer_quiz(0).unwrap();
        sink.quiz_outcome(&outcome).unwrap();
        sink.render(&e.frame()).unwrap();

        let text = output(sink);
        assert_eq!(text.matches("generating quiz for LONG").count(), 1);
        assert_eq!(text.matches("Why long here?").count(), 1);
        assert!(text.contains("  2. b"));
        assert!(text.contains("Correct: yes"));
    }

    #[test]
    fn failure_is_printed() {
        let mut e = engine();
        let mut sink = ConsoleSink::new(Vec::new());
        let dispatch = e.open_trade(Action::Long);
        e.resolve_quiz(
            dispatch.ticket,
            Err(crate::domain::error::QuizError::Status { status: 500 }),
        );
        sink.render(&e.frame()).unwrap();
        let text = output(sink);
        assert!(text.contains("quiz failed: quiz service returned status 500"));
        assert!(text.contains("retry or dismiss"));
    }
}
