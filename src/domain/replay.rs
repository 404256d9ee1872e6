//! Replay engine.
//!
//! Owns the cursor over a fixed bar sequence, the open position and the
//! derived PnL, markers and study series. Every mutation goes through a
//! method here; drivers (the interactive session, tests) only call them in
//! sequence, so no two updates ever overlap.
//!
//! The quiz is the one asynchronous hand-off. [`ReplayEngine::open_trade`]
//! returns a [`QuizDispatch`]; the driver runs it and feeds the result back
//! through [`ReplayEngine::resolve_quiz`]. Each dispatch carries a ticket and
//! a result whose ticket is no longer outstanding is dropped.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::bar::{recent_window, validate_bars, Bar};
use crate::domain::error::{QuizError, ReplayError};
use crate::domain::indicator::StudyKind;
use crate::domain::position::{Action, Pnl, TradeMarker};
use crate::domain::quiz::{
    Quiz, QuizDispatch, QuizOutcome, QuizRequest, QuizState, QuizTicket, DEFAULT_WINDOW,
};
use crate::domain::studies::{StudyOutput, StudyParams, StudySet};

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    pub trade_size: f64,
    pub quiz_window: usize,
    pub studies: StudyParams,
    pub enabled: StudySet,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            trade_size: 1.0,
            quiz_window: DEFAULT_WINDOW,
            studies: StudyParams::default(),
            enabled: StudySet::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayState {
    pub cursor: usize,
    pub is_playing: bool,
    pub position: Action,
    pub entry_price: Option<f64>,
    pub trade_size: f64,
    pub markers: Vec<TradeMarker>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Playback {
    Paused,
    Playing,
    Ended,
}

/// Everything a chart needs to draw the current step.
#[derive(Debug, Clone, Serialize)]
pub struct Frame<'a> {
    pub cursor: usize,
    pub time: i64,
    pub playback: Playback,
    pub bars: &'a [Bar],
    pub studies: &'a StudyOutput,
    pub enabled: StudySet,
    pub markers: &'a [TradeMarker],
    pub position: Action,
    pub entry_price: Option<f64>,
    pub trade_size: f64,
    pub pnl: Pnl,
    pub balance: f64,
    pub quiz: &'a QuizState,
}

pub struct ReplayEngine {
    bars: Vec<Bar>,
    state: ReplayState,
    params: StudyParams,
    enabled: StudySet,
    quiz_window: usize,
    studies: StudyOutput,
    pnl: Pnl,
    quiz: QuizState,
    next_ticket: u64,
}

fn check_trade_size(size: f64) -> Result<(), ReplayError> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(ReplayError::invalid(
            "trade size",
            format!("{size} is not a positive number"),
        ))
    }
}

impl ReplayEngine {
    pub fn new(bars: Vec<Bar>, config: ReplayConfig) -> Result<Self, ReplayError> {
        validate_bars(&bars)?;
        check_trade_size(config.trade_size)?;
        if config.quiz_window == 0 {
            return Err(ReplayError::invalid("quiz window", "must be at least 1"));
        }
        config.studies.validate()?;

        let studies = StudyOutput::compute(&bars[..1], &config.studies, &config.enabled);
        Ok(Self {
            bars,
            state: ReplayState {
                cursor: 0,
                is_playing: false,
                position: Action::None,
                entry_price: None,
                trade_size: config.trade_size,
                markers: Vec::new(),
            },
            params: config.studies,
            enabled: config.enabled,
            quiz_window: config.quiz_window,
            studies,
            pnl: Pnl::default(),
            quiz: QuizState::Idle,
            next_ticket: 0,
        })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn state(&self) -> &ReplayState {
        &self.state
    }

    pub fn studies(&self) -> &StudyOutput {
        &self.studies
    }

    pub fn enabled_studies(&self) -> StudySet {
        self.enabled
    }

    pub fn pnl(&self) -> Pnl {
        self.pnl
    }

    pub fn quiz(&self) -> &QuizState {
        &self.quiz
    }

    pub fn current_bar(&self) -> &Bar {
        &self.bars[self.state.cursor]
    }

    /// Bars visible at the cursor, inclusive.
    pub fn visible(&self) -> &[Bar] {
        &self.bars[..=self.state.cursor]
    }

    pub fn is_at_end(&self) -> bool {
        self.state.cursor + 1 >= self.bars.len()
    }

    pub fn playback(&self) -> Playback {
        if self.state.is_playing {
            Playback::Playing
        } else if self.is_at_end() {
            Playback::Ended
        } else {
            Playback::Paused
        }
    }

    /// Step one bar forward. Returns false at the last bar, where the only
    /// effect is to stop playback.
    pub fn advance(&mut self) -> bool {
        if self.is_at_end() {
            self.state.is_playing = false;
            return false;
        }

        self.state.cursor += 1;
        self.refresh_studies();
        self.refresh_pnl();
        debug!(cursor = self.state.cursor, time = self.current_bar().time, "advanced");

        if self.is_at_end() && self.state.is_playing {
            self.state.is_playing = false;
            info!(cursor = self.state.cursor, "end of sequence, playback stopped");
        }
        true
    }

    /// Manual single step. Refused while a quiz is outstanding, like play.
    pub fn step(&mut self) -> Result<bool, ReplayError> {
        if self.quiz.is_outstanding() {
            return Err(ReplayError::QuizOutstanding);
        }
        Ok(self.advance())
    }

    /// Timer callback: advances only while playing.
    pub fn tick(&mut self) -> bool {
        self.state.is_playing && self.advance()
    }

    pub fn set_playing(&mut self, playing: bool) -> Result<Playback, ReplayError> {
        if playing {
            if self.quiz.is_outstanding() {
                return Err(ReplayError::QuizOutstanding);
            }
            if self.is_at_end() {
                self.state.is_playing = false;
                return Ok(Playback::Ended);
            }
        }
        if self.state.is_playing != playing {
            info!(cursor = self.state.cursor, playing, "playback changed");
        }
        self.state.is_playing = playing;
        Ok(self.playback())
    }

    /// Commit `action` at the current close and build the quiz request for it.
    /// Any earlier quiz is superseded.
    pub fn open_trade(&mut self, action: Action) -> QuizDispatch {
        self.state.is_playing = false;
        self.state.position = action;

        let bar = *self.current_bar();
        match action.side() {
            Some(side) => {
                self.state.entry_price = Some(bar.close);
                self.state.markers.push(TradeMarker::entry(bar.time, side));
                info!(%action, price = bar.close, time = bar.time, "position opened");
            }
            None => {
                self.state.entry_price = None;
                info!(time = bar.time, "skipped");
            }
        }
        self.refresh_pnl();

        let request = QuizRequest {
            action,
            recent_candles: recent_window(&self.bars, self.state.cursor, self.quiz_window)
                .to_vec(),
        };
        self.dispatch(request)
    }

    /// Feed back a quiz result. Returns false when `ticket` is stale.
    pub fn resolve_quiz(&mut self, ticket: QuizTicket, result: Result<Quiz, QuizError>) -> bool {
        let request = match &self.quiz {
            QuizState::Pending {
                ticket: pending,
                request,
                ..
            } if *pending == ticket => request.clone(),
            _ => {
                debug!(ticket = ticket.0, "discarding stale quiz result");
                return false;
            }
        };

        self.quiz = match result.and_then(|quiz| quiz.validate().map(|()| quiz)) {
            Ok(quiz) => QuizState::Ready { quiz, answer: None },
            Err(err) => {
                warn!(ticket = ticket.0, error = %err, "quiz generation failed");
                QuizState::Failed {
                    reason: err.to_string(),
                    request,
                }
            }
        };
        true
    }

    /// Re-send the request that failed.
    pub fn retry_quiz(&mut self) -> Result<QuizDispatch, ReplayError> {
        match &self.quiz {
            QuizState::Failed { request, .. } => {
                let request = request.clone();
                Ok(self.dispatch(request))
            }
            _ => Err(ReplayError::NoQuiz {
                expected: "failed",
            }),
        }
    }

    /// Grade a zero-based choice. A quiz can be answered once.
    pub fn answer_quiz(&mut self, selected: usize) -> Result<QuizOutcome, ReplayError> {
        let QuizState::Ready { quiz, answer } = &mut self.quiz else {
            return Err(ReplayError::NoQuiz {
                expected: "displayed",
            });
        };
        if answer.is_some() {
            return Err(ReplayError::invalid("answer", "quiz already answered"));
        }
        let outcome = quiz.grade(selected)?;
        info!(selected, correct = outcome.correct, "quiz answered");
        *answer = Some(outcome.clone());
        Ok(outcome)
    }

    /// Close the quiz in any state. Playback stays paused.
    pub fn dismiss_quiz(&mut self) -> Result<(), ReplayError> {
        if !self.quiz.is_outstanding() {
            return Err(ReplayError::NoQuiz {
                expected: "outstanding",
            });
        }
        self.quiz = QuizState::Idle;
        Ok(())
    }

    pub fn set_trade_size(&mut self, size: f64) -> Result<(), ReplayError> {
        check_trade_size(size)?;
        self.state.trade_size = size;
        self.refresh_pnl();
        Ok(())
    }

    pub fn toggle_study(&mut self, kind: StudyKind, enabled: bool) {
        self.enabled.set(kind, enabled);
        if enabled {
            let prefix = &self.bars[..=self.state.cursor];
            self.studies.recompute(kind, prefix, &self.params);
        } else {
            self.studies.clear(kind);
        }
        debug!(study = %kind, enabled, "study toggled");
    }

    pub fn frame(&self) -> Frame<'_> {
        Frame {
            cursor: self.state.cursor,
            time: self.current_bar().time,
            playback: self.playback(),
            bars: self.visible(),
            studies: &self.studies,
            enabled: self.enabled,
            markers: &self.state.markers,
            position: self.state.position,
            entry_price: self.state.entry_price,
            trade_size: self.state.trade_size,
            pnl: self.pnl,
            balance: self.pnl.total,
            quiz: &self.quiz,
        }
    }

    fn dispatch(&mut self, request: QuizRequest) -> QuizDispatch {
        self.next_ticket += 1;
        let ticket = QuizTicket(self.next_ticket);
        self.quiz = QuizState::Pending {
            ticket,
            action: request.action,
            request: request.clone(),
        };
        debug!(ticket = ticket.0, bars = request.recent_candles.len(), "quiz requested");
        QuizDispatch { ticket, request }
    }

    fn refresh_studies(&mut self) {
        let prefix = &self.bars[..=self.state.cursor];
        for kind in StudyKind::ALL {
            if self.enabled.is_enabled(kind) {
                self.studies.recompute(kind, prefix, &self.params);
            }
        }
    }

    fn refresh_pnl(&mut self) {
        self.pnl = match self.state.entry_price {
            Some(entry) if self.state.position.is_open() => Pnl::compute(
                self.state.position,
                entry,
                self.current_bar().close,
                self.state.trade_size,
            ),
            _ => Pnl::default(),
        };
    }
}
