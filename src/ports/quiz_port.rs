//! Quiz collaborator port trait.

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::QuizError;
use crate::domain::quiz::{Quiz, QuizRequest};

/// Backend-agnostic quiz generation.
///
/// Implemented by the HTTP quiz service client, the chat-completion client
/// and a disabled stand-in that always fails.
#[async_trait]
pub trait QuizPort: Send + Sync {
    async fn generate(&self, request: &QuizRequest) -> Result<Quiz, QuizError>;

    fn backend_name(&self) -> &'static str;
}

/// `[quiz] provider` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizProvider {
    Disabled,
    Service,
    OpenAi,
}

impl fmt::Display for QuizProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizProvider::Disabled => write!(f, "disabled"),
            QuizProvider::Service => write!(f, "service"),
            QuizProvider::OpenAi => write!(f, "openai"),
        }
    }
}

impl FromStr for QuizProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "none" | "" => Ok(QuizProvider::Disabled),
            "service" => Ok(QuizProvider::Service),
            "openai" => Ok(QuizProvider::OpenAi),
            other => Err(format!(
                "unknown quiz provider '{other}' (expected disabled, service or openai)"
            )),
        }
    }
}
