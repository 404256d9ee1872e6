//! Quiz collaborator contract.
//!
//! On every trade entry the engine emits a [`QuizRequest`] carrying the
//! chosen action and a bounded window of recent bars. The collaborator
//! answers with a three-option multiple-choice [`Quiz`]; anything that does
//! not conform is a [`QuizError::Malformed`].

use serde::{Deserialize, Serialize};

use crate::domain::bar::Bar;
use crate::domain::error::{QuizError, ReplayError};
use crate::domain::position::Action;

pub const DEFAULT_WINDOW: usize = 14;
pub const OPTION_COUNT: usize = 3;

/// Wire request: `{ "action": "LONG", "recentCandles": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    pub action: Action,
    pub recent_candles: Vec<Bar>,
}

/// Identifies one dispatched request so late completions can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct QuizTicket(pub u64);

/// A request the driver must hand to the quiz port, then report back with
/// [`crate::domain::replay::ReplayEngine::resolve_quiz`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuizDispatch {
    pub ticket: QuizTicket,
    pub request: QuizRequest,
}

/// An option or feedback entry: either bare text or `{ text, isCorrect }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuizChoice {
    Plain(String),
    #[serde(rename_all = "camelCase")]
    Detailed { text: String, is_correct: bool },
}

impl QuizChoice {
    pub fn text(&self) -> &str {
        match self {
            QuizChoice::Plain(text) => text,
            QuizChoice::Detailed { text, .. } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub question: String,
    pub options: Vec<QuizChoice>,
    pub correct_index: usize,
    pub feedback: Vec<QuizChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizOutcome {
    pub selected: usize,
    pub correct: bool,
    pub feedback: String,
}

impl Quiz {
    /// Parse a collaborator reply. Prose around the JSON object is tolerated:
    /// everything from the first `{` to the last `}` is parsed.
    pub fn from_raw_text(raw: &str) -> Result<Self, QuizError> {
        let start = raw.find('{');
        let end = raw.rfind('}');
        let json = match (start, end) {
            (Some(s), Some(e)) if s < e => &raw[s..=e],
            _ => {
                return Err(QuizError::Malformed {
                    reason: "no JSON object found".into(),
                });
            }
        };
        let quiz: Quiz = serde_json::from_str(json)?;
        quiz.validate()?;
        Ok(quiz)
    }

    pub fn validate(&self) -> Result<(), QuizError> {
        let malformed = |reason: String| Err(QuizError::Malformed { reason });
        if self.question.trim().is_empty() {
            return malformed("empty question".into());
        }
        if self.options.len() != OPTION_COUNT {
            return malformed(format!(
                "expected {OPTION_COUNT} options, got {}",
                self.options.len()
            ));
        }
        if self.feedback.len() != OPTION_COUNT {
            return malformed(format!(
                "expected {OPTION_COUNT} feedback entries, got {}",
                self.feedback.len()
            ));
        }
        if self.correct_index >= OPTION_COUNT {
            return malformed(format!("correctIndex {} out of range", self.correct_index));
        }
        Ok(())
    }

    /// Grade a zero-based answer.
    pub fn grade(&self, selected: usize) -> Result<QuizOutcome, ReplayError> {
        let feedback = self.feedback.get(selected).ok_or_else(|| {
            ReplayError::invalid(
                "answer",
                format!("choose 1 to {}", self.options.len()),
            )
        })?;
        Ok(QuizOutcome {
            selected,
            correct: selected == self.correct_index,
            feedback: feedback.text().to_string(),
        })
    }
}

/// Quiz lifecycle as seen by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum QuizState {
    #[default]
    Idle,
    Pending {
        ticket: QuizTicket,
        action: Action,
        #[serde(skip)]
        request: QuizRequest,
    },
    Ready {
        quiz: Quiz,
        answer: Option<QuizOutcome>,
    },
    Failed {
        reason: String,
        #[serde(skip)]
        request: QuizRequest,
    },
}

impl QuizState {
    /// True while the quiz blocks playback.
    pub fn is_outstanding(&self) -> bool {
        !matches!(self, QuizState::Idle)
    }
}
