//! Interactive replay session.
//!
//! A single tokio task owns the engine and serialises three event sources:
//! command lines from the input, playback ticks and quiz completions. Quiz
//! generation runs on spawned tasks and reports back over a channel.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::adapters::ticker::Ticker;
use crate::domain::error::{QuizError, ReplayError};
use crate::domain::indicator::StudyKind;
use crate::domain::position::{Action, Pnl};
use crate::domain::quiz::{Quiz, QuizDispatch, QuizState, QuizTicket};
use crate::domain::replay::ReplayEngine;
use crate::ports::quiz_port::QuizPort;
use crate::ports::render_port::RenderSink;

pub const HELP: &str = "\
commands:
  play | pause          start or stop playback
  step                  advance one bar
  long | short | skip   act at the current bar
  size <n>              set the trade size
  rsi|bb|macd on|off    toggle a study
  answer <1-3>          answer the quiz (a bare number works too)
  dismiss | retry       close the quiz, or re-request a failed one
  wait                  block until the quiz arrives and playback stops
  status | help | quit";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Step,
    Trade(Action),
    Size(f64),
    Study(StudyKind, bool),
    Answer(usize),
    Dismiss,
    Retry,
    Wait,
    Status,
    Help,
    Quit,
}

fn parse_switch(value: Option<&str>) -> Result<bool, ReplayError> {
    match value {
        Some("on") => Ok(true),
        Some("off") => Ok(false),
        _ => Err(ReplayError::invalid("study switch", "expected 'on' or 'off'")),
    }
}

fn parse_choice(value: &str) -> Result<usize, ReplayError> {
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ReplayError::invalid(
            "answer",
            format!("'{value}' is not a choice number"),
        )),
    }
}

impl FromStr for Command {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let mut words = lowered.split_whitespace();
        let head = words.next().unwrap_or_default();
        let arg = words.next();

        let command = match head {
            "play" => Command::Play,
            "pause" => Command::Pause,
            "step" | "next" => Command::Step,
            "long" | "buy" => Command::Trade(Action::Long),
            "short" | "sell" => Command::Trade(Action::Short),
            "skip" => Command::Trade(Action::None),
            "size" => {
                let raw = arg.ok_or_else(|| ReplayError::invalid("trade size", "missing value"))?;
                let size = raw
                    .parse::<f64>()
                    .map_err(|_| ReplayError::invalid("trade size", format!("'{raw}' is not a number")))?;
                Command::Size(size)
            }
            "rsi" | "bb" | "bollinger" | "macd" => {
                Command::Study(head.parse()?, parse_switch(arg)?)
            }
            "answer" => {
                let raw = arg.ok_or_else(|| ReplayError::invalid("answer", "missing choice"))?;
                Command::Answer(parse_choice(raw)?)
            }
            "dismiss" | "close" => Command::Dismiss,
            "retry" => Command::Retry,
            "wait" => Command::Wait,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other if other.chars().all(|c| c.is_ascii_digit()) && !other.is_empty() => {
                Command::Answer(parse_choice(other)?)
            }
            other => {
                return Err(ReplayError::invalid(
                    "command",
                    format!("unknown command '{other}' (try help)"),
                ));
            }
        };
        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Play => write!(f, "play"),
            Command::Pause => write!(f, "pause"),
            Command::Step => write!(f, "step"),
            Command::Trade(action) => write!(f, "{action}"),
            Command::Size(size) => write!(f, "size {size}"),
            Command::Study(kind, on) => write!(f, "{kind} {}", if *on { "on" } else { "off" }),
            Command::Answer(i) => write!(f, "answer {}", i + 1),
            Command::Dismiss => write!(f, "dismiss"),
            Command::Retry => write!(f, "retry"),
            Command::Wait => write!(f, "wait"),
            Command::Status => write!(f, "status"),
            Command::Help => write!(f, "help"),
            Command::Quit => write!(f, "quit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub cursor: usize,
    pub bars: usize,
    pub trades: usize,
    pub position: Action,
    pub pnl: Pnl,
    pub quizzes_answered: usize,
    pub quizzes_correct: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

type QuizResult = (QuizTicket, Result<Quiz, QuizError>);

pub struct Session {
    engine: ReplayEngine,
    quiz_port: Arc<dyn QuizPort>,
    sinks: Vec<Box<dyn RenderSink>>,
    ticker: Ticker,
    results_tx: mpsc::UnboundedSender<QuizResult>,
    results_rx: mpsc::UnboundedReceiver<QuizResult>,
    waiting: bool,
    answered: usize,
    correct: usize,
}

impl Session {
    pub fn new(engine: ReplayEngine, quiz_port: Arc<dyn QuizPort>, tick: Duration) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            quiz_port,
            sinks: Vec::new(),
            ticker: Ticker::new(tick),
            results_tx,
            results_rx,
            waiting: false,
            answered: 0,
            correct: 0,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn RenderSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn engine(&self) -> &ReplayEngine {
        &self.engine
    }

    pub fn summary(&self) -> SessionSummary {
        let state = self.engine.state();
        SessionSummary {
            cursor: state.cursor,
            bars: self.engine.bars().len(),
            trades: state.markers.len(),
            position: state.position,
            pnl: self.engine.pnl(),
            quizzes_answered: self.answered,
            quizzes_correct: self.correct,
        }
    }

    /// Run until `quit` or end of input. Only sink I/O failures end the
    /// session with an error; bad commands are reported and skipped.
    pub async fn run<R>(&mut self, input: R) -> Result<SessionSummary, ReplayError>
    where
        R: AsyncBufRead + Unpin,
    {
        info!(
            bars = self.engine.bars().len(),
            backend = self.quiz_port.backend_name(),
            tick_ms = self.ticker.period().as_millis() as u64,
            "session started"
        );
        let mut lines = input.lines();
        self.render()?;

        loop {
            tokio::select! {
                line = lines.next_line(), if !self.waiting => {
                    match line? {
                        Some(line) => {
                            if self.handle_line(&line)? == Flow::Quit {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = self.ticker.tick() => {
                    if self.engine.tick() {
                        self.render()?;
                    }
                }
                Some((ticket, result)) = self.results_rx.recv() => {
                    if self.engine.resolve_quiz(ticket, result) {
                        self.render()?;
                    }
                }
            }
            self.ticker.set_running(self.engine.state().is_playing);
            self.update_waiting();
        }

        let summary = self.summary();
        info!(cursor = summary.cursor, trades = summary.trades, "session finished");
        Ok(summary)
    }

    fn update_waiting(&mut self) {
        if self.waiting {
            let pending = matches!(self.engine.quiz(), QuizState::Pending { .. });
            self.waiting = pending || self.engine.state().is_playing;
        }
    }

    fn handle_line(&mut self, line: &str) -> Result<Flow, ReplayError> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        let result = line.parse::<Command>().and_then(|cmd| {
            debug!(command = %cmd, "command");
            self.execute(cmd)
        });
        match result {
            Ok(flow) => Ok(flow),
            Err(ReplayError::Io(e)) => Err(ReplayError::Io(e)),
            Err(e) => {
                self.notice(&format!("error: {e}"))?;
                Ok(Flow::Continue)
            }
        }
    }

    fn execute(&mut self, command: Command) -> Result<Flow, ReplayError> {
        match command {
            Command::Play => {
                self.engine.set_playing(true)?;
                self.render()?;
            }
            Command::Pause => {
                self.engine.set_playing(false)?;
                self.render()?;
            }
            Command::Step => {
                if self.engine.step()? {
                    self.render()?;
                } else {
                    self.notice("end of data")?;
                }
            }
            Command::Trade(action) => {
                let dispatch = self.engine.open_trade(action);
                self.spawn_quiz(dispatch);
                self.render()?;
            }
            Command::Size(size) => {
                self.engine.set_trade_size(size)?;
                self.render()?;
            }
            Command::Study(kind, enabled) => {
                self.engine.toggle_study(kind, enabled);
                self.render()?;
            }
            Command::Answer(choice) => {
                let outcome = self.engine.answer_quiz(choice)?;
                self.answered += 1;
                if outcome.correct {
                    self.correct += 1;
                }
                for sink in &mut self.sinks {
                    sink.quiz_outcome(&outcome)?;
                }
            }
            Command::Dismiss => {
                self.engine.dismiss_quiz()?;
                self.render()?;
            }
            Command::Retry => {
                let dispatch = self.engine.retry_quiz()?;
                self.spawn_quiz(dispatch);
                self.render()?;
            }
            Command::Wait => {
                self.waiting = true;
                self.update_waiting();
            }
            Command::Status => self.render()?,
            Command::Help => self.notice(HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn spawn_quiz(&self, dispatch: QuizDispatch) {
        let port = Arc::clone(&self.quiz_port);
        let tx = self.results_tx.clone();
        debug!(ticket = dispatch.ticket.0, backend = port.backend_name(), "spawning quiz request");
        tokio::spawn(async move {
            let result = port.generate(&dispatch.request).await;
            // A closed channel means the session has ended.
            let _ = tx.send((dispatch.ticket, result));
        });
    }

    fn render(&mut self) -> Result<(), ReplayError> {
        let frame = self.engine.frame();
        for sink in &mut self.sinks {
            sink.render(&frame)?;
        }
        Ok(())
    }

    fn notice(&mut self, text: &str) -> Result<(), ReplayError> {
        for sink in &mut self.sinks {
            sink.notice(text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_commands() {
        assert_eq!("play".parse::<Command>().unwrap(), Command::Play);
        assert_eq!(" PAUSE ".parse::<Command>().unwrap(), Command::Pause);
        assert_eq!("next".parse::<Command>().unwrap(), Command::Step);
        assert_eq!("long".parse::<Command>().unwrap(), Command::Trade(Action::Long));
        assert_eq!("sell".parse::<Command>().unwrap(), Command::Trade(Action::Short));
        assert_eq!("skip".parse::<Command>().unwrap(), Command::Trade(Action::None));
        assert_eq!("q".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn parses_arguments() {
        assert_eq!("size 2.5".parse::<Command>().unwrap(), Command::Size(2.5));
        assert_eq!(
            "bb off".parse::<Command>().unwrap(),
            Command::Study(StudyKind::Bollinger, false)
        );
        assert_eq!(
            "MACD on".parse::<Command>().unwrap(),
            Command::Study(StudyKind::Macd, true)
        );
        assert_eq!("answer 2".parse::<Command>().unwrap(), Command::Answer(1));
        assert_eq!("3".parse::<Command>().unwrap(), Command::Answer(2));
    }

    #[test]
    fn rejects_bad_input() {
        for bad in ["size", "size big", "rsi", "rsi maybe", "answer 0", "answer x", "fly"] {
            assert!(
                matches!(bad.parse::<Command>(), Err(ReplayError::InvalidParameter { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn display_round_trips_for_help_text() {
        assert_eq!(Command::Answer(0).to_string(), "answer 1");
        assert_eq!(Command::Study(StudyKind::Rsi, true).to_string(), "RSI on");
        assert_eq!(Command::Trade(Action::Short).to_string(), "SHORT");
    }
}
