#![allow(dead_code)]

use async_trait::async_trait;
use shadowtape::domain::bar::Bar;
use shadowtape::domain::error::{QuizError, ReplayError};
use shadowtape::domain::quiz::{Quiz, QuizChoice, QuizOutcome, QuizRequest};
use shadowtape::domain::replay::{Frame, Playback};
use shadowtape::ports::quiz_port::QuizPort;
use shadowtape::ports::render_port::RenderSink;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Quiz port that answers from memory. The first `failures` calls fail.
pub struct MockQuizPort {
    pub quiz: Quiz,
    pub failures: AtomicUsize,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<QuizRequest>>,
}

impl MockQuizPort {
    pub fn new() -> Self {
        Self {
            quiz: sample_quiz(),
            failures: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(times: usize) -> Self {
        let port = Self::new();
        port.failures.store(times, Ordering::SeqCst);
        port
    }

    pub fn with_quiz(mut self, quiz: Quiz) -> Self {
        self.quiz = quiz;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuizPort for MockQuizPort {
    async fn generate(&self, request: &QuizRequest) -> Result<Quiz, QuizError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(QuizError::Unavailable("mock outage".to_string()));
        }
        Ok(self.quiz.clone())
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

pub fn sample_quiz() -> Quiz {
    Quiz {
        question: "What did price do after the last swing low?".to_string(),
        options: vec![
            QuizChoice::Plain("Made a higher low".to_string()),
            QuizChoice::Plain("Made a lower low".to_string()),
            QuizChoice::Plain("Went sideways".to_string()),
        ],
        correct_index: 0,
        feedback: vec![
            QuizChoice::Plain("Right, buyers stepped in early.".to_string()),
            QuizChoice::Plain("Look again at the last three lows.".to_string()),
            QuizChoice::Plain("The range broke upward.".to_string()),
        ],
    }
}

/// What a sink saw in one render call.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub cursor: usize,
    pub playback: Playback,
    pub visible: usize,
    pub pnl_total: f64,
    pub quiz_outstanding: bool,
}

#[derive(Debug, Default)]
pub struct Recording {
    pub frames: Vec<FrameRecord>,
    pub outcomes: Vec<QuizOutcome>,
    pub notices: Vec<String>,
}

/// Render sink that shares everything it receives with the test.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub log: Arc<Mutex<Recording>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<FrameRecord> {
        self.log.lock().unwrap().frames.last().cloned()
    }

    pub fn notices(&self) -> Vec<String> {
        self.log.lock().unwrap().notices.clone()
    }

    pub fn outcomes(&self) -> Vec<QuizOutcome> {
        self.log.lock().unwrap().outcomes.clone()
    }
}

impl RenderSink for RecordingSink {
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), ReplayError> {
        self.log.lock().unwrap().frames.push(FrameRecord {
            cursor: frame.cursor,
            playback: frame.playback,
            visible: frame.bars.len(),
            pnl_total: frame.pnl.total,
            quiz_outstanding: frame.quiz.is_outstanding(),
        });
        Ok(())
    }

    fn quiz_outcome(&mut self, outcome: &QuizOutcome) -> Result<(), ReplayError> {
        self.log.lock().unwrap().outcomes.push(outcome.clone());
        Ok(())
    }

    fn notice(&mut self, text: &str) -> Result<(), ReplayError> {
        self.log.lock().unwrap().notices.push(text.to_string());
        Ok(())
    }
}

pub const START: i64 = 1_704_205_800; // 2024-01-02T14:30:00Z

pub fn make_bar(index: usize, close: f64) -> Bar {
    Bar {
        time: START + index as i64 * 60,
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
    }
}

pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c))
        .collect()
}

/// A gently oscillating uptrend, long enough to warm up every study.
pub fn generate_bars(count: usize) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let close = 100.0 + i as f64 * 0.3 + (i as f64 * 0.7).sin() * 2.0;
            make_bar(i, close)
        })
        .collect()
}

pub fn write_temp_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn write_bars_json(bars: &[Bar]) -> tempfile::NamedTempFile {
    write_temp_file(".json", &serde_json::to_string(bars).unwrap())
}

pub fn write_bars_csv(bars: &[Bar]) -> tempfile::NamedTempFile {
    let mut content = String::from("time,open,high,low,close\n");
    for b in bars {
        content.push_str(&format!("{},{},{},{},{}\n", b.time, b.open, b.high, b.low, b.close));
    }
    write_temp_file(".csv", &content)
}
