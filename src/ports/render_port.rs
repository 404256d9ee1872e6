//! Frame sink port trait.

use crate::domain::error::ReplayError;
use crate::domain::quiz::QuizOutcome;
use crate::domain::replay::Frame;

/// Receives the engine's view after every change. An empty series in a
/// frame means the overlay should be cleared.
pub trait RenderSink {
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), ReplayError>;

    /// Result of grading an answer. Sinks that only draw charts ignore it.
    fn quiz_outcome(&mut self, _outcome: &QuizOutcome) -> Result<(), ReplayError> {
        Ok(())
    }

    /// Free-form feedback for the user (command errors, help).
    fn notice(&mut self, _text: &str) -> Result<(), ReplayError> {
        Ok(())
    }
}
