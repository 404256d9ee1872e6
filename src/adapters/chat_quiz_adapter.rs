//! Quiz generation through an OpenAI-compatible chat-completion endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::adapters::quiz_service_adapter::transport_error;
use crate::domain::error::QuizError;
use crate::domain::quiz::{Quiz, QuizRequest};
use crate::ports::quiz_port::QuizPort;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.6;

const SYSTEM_PROMPT: &str = "Produce precise JSON based on technical analysis.";

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub api_key: String,
    pub timeout: Duration,
}

pub struct ChatQuizAdapter {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f64,
    api_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatQuizAdapter {
    pub fn new(settings: ChatSettings) -> Result<Self, QuizError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        let endpoint = format!(
            "{}/chat/completions",
            settings.base_url.trim_end_matches('/')
        );
        Ok(Self {
            client,
            endpoint,
            model: settings.model,
            temperature: settings.temperature,
            api_key: settings.api_key,
        })
    }
}

/// Coaching prompt: the chosen action, one line per bar, and the required
/// JSON shape.
pub fn build_prompt(request: &QuizRequest) -> String {
    let bars: Vec<String> = request
        .recent_candles
        .iter()
        .map(|c| {
            format!(
                "• Time: {}, Open: {}, High: {}, Low: {}, Close: {}",
                c.iso_time(),
                c.open,
                c.high,
                c.low,
                c.close
            )
        })
        .collect();

    format!(
        "You are an expert technical analysis coach. A user has chosen to go {action} after \
observing these recent candlestick bars and associated market context:
{bars}

Using advanced technical analysis concepts (e.g., trendlines, support/resistance zones, moving \
averages, RSI, MACD, volume patterns, chart patterns), generate a robust multiple-choice question:
1. 'question': A clear, concise question asking why this trade makes sense.
2. 'options': An array of exactly 3 plausible, detailed TA-based reasons (one correct, two \
distractors) that reference indicators, patterns, or price action.
3. 'correctIndex': The index (0-based) of the best answer.
4. 'feedback': Provide specific informative feedback for each option, explaining why it's \
correct or not, and referencing TA principles.

Return only valid JSON. No markdown or code fences.",
        action = request.action,
        bars = bars.join("\n"),
    )
}

fn quiz_from_completion(response: ChatResponse) -> Result<Quiz, QuizError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();
    Quiz::from_raw_text(&content)
}

#[async_trait]
impl QuizPort for ChatQuizAdapter {
    async fn generate(&self, request: &QuizRequest) -> Result<Quiz, QuizError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: Some(SYSTEM_PROMPT.into()),
                },
                ChatMessage {
                    role: "user".into(),
                    content: Some(build_prompt(request)),
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuizError::Status {
                status: status.as_u16(),
            });
        }

        let completion: ChatResponse = response.json().await.map_err(transport_error)?;
        debug!(model = %self.model, choices = completion.choices.len(), "chat completion received");
        quiz_from_completion(completion)
    }

    fn backend_name(&self) -> &'static str {
        "openai"
    }
}
