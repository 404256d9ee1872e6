//! Quiz port used when no provider is configured.

use async_trait::async_trait;

use crate::domain::error::QuizError;
use crate::domain::quiz::{Quiz, QuizRequest};
use crate::ports::quiz_port::QuizPort;

#[derive(Debug, Default)]
pub struct DisabledQuizAdapter;

#[async_trait]
impl QuizPort for DisabledQuizAdapter {
    async fn generate(&self, _request: &QuizRequest) -> Result<Quiz, QuizError> {
        Err(QuizError::Unavailable(
            "no quiz provider configured (set [quiz] provider)".into(),
        ))
    }

    fn backend_name(&self) -> &'static str {
        "disabled"
    }
}
