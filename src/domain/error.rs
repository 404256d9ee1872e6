//! Domain error types.

/// Failure talking to the quiz collaborator. Always recoverable: the
/// engine records it as a failed quiz and the user may retry.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[cfg(feature = "http")]
    #[error("quiz request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("quiz service returned status {status}")]
    Status { status: u16 },

    #[error("quiz request timed out")]
    Timeout,

    #[error("malformed quiz: {reason}")]
    Malformed { reason: String },

    #[error("quiz unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for QuizError {
    fn from(err: serde_json::Error) -> Self {
        QuizError::Malformed {
            reason: err.to_string(),
        }
    }
}

/// Top-level error type for shadowtape.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("bar data error: {reason}")]
    BarSource { reason: String },

    #[error("no bars to replay")]
    NoBars,

    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("a quiz is still outstanding; answer or dismiss it first")]
    QuizOutstanding,

    #[error("no quiz is {expected}")]
    NoQuiz { expected: &'static str },

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReplayError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ReplayError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<&ReplayError> for std::process::ExitCode {
    fn from(err: &ReplayError) -> Self {
        let code: u8 = match err {
            ReplayError::Io(_) => 1,
            ReplayError::ConfigParse { .. }
            | ReplayError::ConfigMissing { .. }
            | ReplayError::ConfigInvalid { .. } => 2,
            ReplayError::BarSource { .. } | ReplayError::NoBars => 3,
            ReplayError::InvalidParameter { .. }
            | ReplayError::QuizOutstanding
            | ReplayError::NoQuiz { .. } => 4,
            ReplayError::Quiz(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
