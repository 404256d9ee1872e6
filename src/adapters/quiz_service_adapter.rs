//! HTTP quiz service client.
//!
//! POSTs the wire request (`{ action, recentCandles }`) to a configured URL
//! and parses the reply body as a quiz.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::domain::error::QuizError;
use crate::domain::quiz::{Quiz, QuizRequest};
use crate::ports::quiz_port::QuizPort;

pub struct QuizServiceAdapter {
    client: reqwest::Client,
    url: String,
}

impl QuizServiceAdapter {
    pub fn new(url: String, timeout: Duration) -> Result<Self, QuizError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

/// Timeouts get their own variant; everything else stays a transport error.
pub(crate) fn transport_error(err: reqwest::Error) -> QuizError {
    if err.is_timeout() {
        QuizError::Timeout
    } else {
        QuizError::Http(err)
    }
}

#[async_trait]
impl QuizPort for QuizServiceAdapter {
    async fn generate(&self, request: &QuizRequest) -> Result<Quiz, QuizError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuizError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport_error)?;
        debug!(bytes = body.len(), "quiz service replied");
        Quiz::from_raw_text(&body)
    }

    fn backend_name(&self) -> &'static str {
        "service"
    }
}
