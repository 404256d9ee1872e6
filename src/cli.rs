//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::console_sink::ConsoleSink;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::disabled_quiz_adapter::DisabledQuizAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_bar_adapter::JsonBarAdapter;
use crate::adapters::json_frame_sink::JsonFrameSink;
use crate::adapters::session::{Session, HELP};
use crate::adapters::ticker::DEFAULT_TICK;
use crate::domain::bar::{validate_bars, Bar};
use crate::domain::config_validation::validate_replay_config;
use crate::domain::error::ReplayError;
use crate::domain::indicator::{
    calculate_bollinger, calculate_ema, calculate_macd, calculate_rsi, IndicatorPoint, StudyKind,
};
use crate::domain::quiz::DEFAULT_WINDOW;
use crate::domain::replay::{ReplayConfig, ReplayEngine};
use crate::domain::studies::{StudyParams, StudySet};
use crate::ports::bar_port::{BarFormat, BarPort};
use crate::ports::config_port::ConfigPort;
use crate::ports::quiz_port::{QuizPort, QuizProvider};

#[derive(Parser, Debug)]
#[command(name = "shadowtape", about = "Bar-by-bar market replay trainer")]
pub struct Cli {
    /// More log output (-v debug, -vv trace); overrides RUST_LOG
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive replay session
    Replay {
        #[arg(short, long)]
        config: PathBuf,
        /// Bar file, overriding [data] path
        #[arg(short, long)]
        bars: Option<PathBuf>,
        /// JSON-lines frame log, overriding [render] frames_path
        #[arg(short, long)]
        frames: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Print indicator values visible at a bar
    Studies {
        #[arg(short, long)]
        bars: PathBuf,
        /// Zero-based bar index; defaults to the last bar
        #[arg(long)]
        cursor: Option<usize>,
        /// Also print an EMA of this period
        #[arg(long)]
        ema: Option<usize>,
    },
    /// Show bar count and time range of a bar file
    Info {
        #[arg(short, long)]
        bars: PathBuf,
    },
}

/// Install the stderr log subscriber. `RUST_LOG` applies unless `-v` is given.
pub fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "shadowtape=info".into()),
        1 => "shadowtape=debug".into(),
        _ => "shadowtape=trace".into(),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Replay {
            config,
            bars,
            frames,
            dry_run,
        } => run_replay(&config, bars.as_deref(), frames.as_deref(), dry_run),
        Command::Studies { bars, cursor, ema } => run_studies(&bars, cursor, ema),
        Command::Info { bars } => run_info(&bars),
    }
}

fn fail(err: ReplayError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

/// Load and order-check a bar file. `format` falls back to the extension.
pub fn load_bars(path: &Path, format: Option<BarFormat>) -> Result<Vec<Bar>, ReplayError> {
    let format = format.unwrap_or_else(|| BarFormat::infer(path));
    let port: Box<dyn BarPort> = match format {
        BarFormat::Json => Box::new(JsonBarAdapter::new(path.to_path_buf())),
        BarFormat::Csv => Box::new(CsvAdapter::new(path.to_path_buf())),
    };
    let bars = port.load_bars()?;
    validate_bars(&bars)?;
    Ok(bars)
}

fn config_usize(adapter: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    usize::try_from(adapter.get_int(section, key, default as i64)).unwrap_or(default)
}

pub fn build_replay_config(adapter: &dyn ConfigPort) -> Result<ReplayConfig, ReplayError> {
    let studies = StudyParams {
        rsi_period: config_usize(adapter, "studies", "rsi_period", 14),
        bollinger_period: config_usize(adapter, "studies", "bollinger_period", 20),
        bollinger_stddev: adapter.get_double("studies", "bollinger_stddev", 2.0),
        macd_fast: config_usize(adapter, "studies", "macd_fast", 12),
        macd_slow: config_usize(adapter, "studies", "macd_slow", 26),
        macd_signal: config_usize(adapter, "studies", "macd_signal", 9),
    };
    studies.validate()?;

    Ok(ReplayConfig {
        trade_size: adapter.get_double("replay", "trade_size", 1.0),
        quiz_window: config_usize(adapter, "replay", "quiz_window", DEFAULT_WINDOW),
        studies,
        enabled: StudySet {
            rsi: adapter.get_bool("studies", "rsi", true),
            bollinger: adapter.get_bool("studies", "bollinger", true),
            macd: adapter.get_bool("studies", "macd", true),
        },
    })
}

fn tick_period(adapter: &dyn ConfigPort) -> Duration {
    let ms = adapter.get_int("replay", "tick_ms", DEFAULT_TICK.as_millis() as i64);
    u64::try_from(ms)
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_TICK)
}

fn quiz_provider(adapter: &dyn ConfigPort) -> Result<QuizProvider, ReplayError> {
    match adapter.get_string("quiz", "provider") {
        Some(p) => p.parse::<QuizProvider>().map_err(|reason| ReplayError::ConfigInvalid {
            section: "quiz".into(),
            key: "provider".into(),
            reason,
        }),
        None => Ok(QuizProvider::Disabled),
    }
}

#[cfg(feature = "http")]
pub fn build_quiz_port(adapter: &FileConfigAdapter) -> Result<Arc<dyn QuizPort>, ReplayError> {
    use crate::adapters::chat_quiz_adapter::ChatQuizAdapter;
    use crate::adapters::quiz_service_adapter::QuizServiceAdapter;

    let timeout = Duration::from_secs(
        u64::try_from(adapter.get_int("quiz", "timeout_secs", 30)).unwrap_or(30),
    );

    let port: Arc<dyn QuizPort> = match quiz_provider(adapter)? {
        QuizProvider::Disabled => Arc::new(DisabledQuizAdapter),
        QuizProvider::Service => {
            let url = adapter
                .get_trimmed("quiz", "url")
                .ok_or_else(|| ReplayError::ConfigMissing {
                    section: "quiz".into(),
                    key: "url".into(),
                })?;
            Arc::new(QuizServiceAdapter::new(url, timeout)?)
        }
        QuizProvider::OpenAi => {
            let key_var = adapter
                .get_trimmed("quiz", "api_key_env")
                .unwrap_or_else(|| "OPENAI_API_KEY".to_string());
            let api_key = std::env::var(&key_var).map_err(|_| ReplayError::ConfigInvalid {
                section: "quiz".into(),
                key: "api_key_env".into(),
                reason: format!("environment variable {key_var} is not set"),
            })?;
            Arc::new(ChatQuizAdapter::new(chat_settings(adapter, api_key, timeout))?)
        }
    };
    Ok(port)
}

/// `[quiz] base_url` is the API root; `/chat/completions` is appended to it.
#[cfg(feature = "http")]
pub fn chat_settings(
    adapter: &FileConfigAdapter,
    api_key: String,
    timeout: Duration,
) -> crate::adapters::chat_quiz_adapter::ChatSettings {
    use crate::adapters::chat_quiz_adapter::{
        ChatSettings, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    };

    ChatSettings {
        base_url: adapter
            .get_trimmed("quiz", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        model: adapter
            .get_trimmed("quiz", "model")
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        temperature: adapter.get_double("quiz", "temperature", DEFAULT_TEMPERATURE),
        api_key,
        timeout,
    }
}

#[cfg(not(feature = "http"))]
pub fn build_quiz_port(adapter: &FileConfigAdapter) -> Result<Arc<dyn QuizPort>, ReplayError> {
    match quiz_provider(adapter)? {
        QuizProvider::Disabled => Ok(Arc::new(DisabledQuizAdapter)),
        other => Err(ReplayError::ConfigInvalid {
            section: "quiz".into(),
            key: "provider".into(),
            reason: format!("provider '{other}' needs the http feature"),
        }),
    }
}

fn configured_bar_format(adapter: &dyn ConfigPort) -> Result<Option<BarFormat>, ReplayError> {
    adapter
        .get_string("data", "format")
        .map(|f| {
            f.parse::<BarFormat>().map_err(|reason| ReplayError::ConfigInvalid {
                section: "data".into(),
                key: "format".into(),
                reason,
            })
        })
        .transpose()
}

fn run_replay(
    config_path: &Path,
    bars_override: Option<&Path>,
    frames_override: Option<&Path>,
    dry_run: bool,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_replay_config(&adapter) {
        return fail(e);
    }

    // Stage 2: Load bars
    let bars_path = match bars_override {
        Some(p) => p.to_path_buf(),
        None => match adapter.get_trimmed("data", "path") {
            Some(p) => PathBuf::from(p),
            None => {
                return fail(ReplayError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                });
            }
        },
    };
    let format = match configured_bar_format(&adapter) {
        Ok(f) if bars_override.is_none() => f,
        Ok(_) => None,
        Err(e) => return fail(e),
    };
    let bars = match load_bars(&bars_path, format) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };
    eprintln!("Loaded {} bars from {}", bars.len(), bars_path.display());

    // Stage 3: Build engine and collaborators
    let replay_config = match build_replay_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let tick = tick_period(&adapter);

    if dry_run {
        return print_dry_run(&bars, &replay_config, tick, &adapter);
    }

    let quiz_port = match build_quiz_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let engine = match ReplayEngine::new(bars, replay_config) {
        Ok(e) => e,
        Err(e) => return fail(e),
    };

    let frames_path = frames_override
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_trimmed("render", "frames_path").map(PathBuf::from));

    let mut session = Session::new(engine, quiz_port, tick)
        .with_sink(Box::new(ConsoleSink::new(std::io::stdout())));
    if let Some(path) = frames_path {
        match JsonFrameSink::create(&path) {
            Ok(sink) => {
                eprintln!("Writing frames to {}", path.display());
                session = session.with_sink(Box::new(sink));
            }
            Err(e) => return fail(e),
        }
    }

    // Stage 4: Run the session on stdin
    eprintln!("{HELP}");
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => return fail(e.into()),
    };
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    match runtime.block_on(session.run(stdin)) {
        Ok(summary) => {
            eprintln!(
                "Stopped at bar {}/{}: {} entries, {} of {} quizzes correct, pnl {:+.2}",
                summary.cursor + 1,
                summary.bars,
                summary.trades,
                summary.quizzes_correct,
                summary.quizzes_answered,
                summary.pnl.total
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn print_dry_run(
    bars: &[Bar],
    config: &ReplayConfig,
    tick: Duration,
    adapter: &dyn ConfigPort,
) -> ExitCode {
    eprintln!("Config validated successfully");
    if let Err(e) = ReplayEngine::new(bars.to_vec(), config.clone()) {
        return fail(e);
    }

    let provider = match quiz_provider(adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let studies: Vec<String> = StudyKind::ALL
        .iter()
        .filter(|k| config.enabled.is_enabled(**k))
        .map(|k| k.to_string())
        .collect();

    println!("bars:        {}", bars.len());
    println!("tick:        {} ms", tick.as_millis());
    println!("trade size:  {}", config.trade_size);
    println!("quiz window: {}", config.quiz_window);
    println!("quiz:        {provider}");
    println!(
        "studies:     {}",
        if studies.is_empty() {
            "none".to_string()
        } else {
            studies.join(", ")
        }
    );
    ExitCode::SUCCESS
}

fn format_last(series: &[IndicatorPoint]) -> String {
    match series.last() {
        Some(p) => format!("{:.4}", p.value),
        None => "n/a".to_string(),
    }
}

fn run_studies(bars_path: &Path, cursor: Option<usize>, ema: Option<usize>) -> ExitCode {
    let bars = match load_bars(bars_path, None) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };
    let last = bars.len() - 1;
    let cursor = cursor.unwrap_or(last);
    if cursor > last {
        return fail(ReplayError::invalid(
            "cursor",
            format!("{cursor} is past the last bar ({last})"),
        ));
    }
    let prefix = &bars[..=cursor];
    let params = StudyParams::default();

    let rsi = calculate_rsi(prefix, params.rsi_period);
    let bb = calculate_bollinger(prefix, params.bollinger_period, params.bollinger_stddev);
    let macd = calculate_macd(prefix, params.macd_fast, params.macd_slow, params.macd_signal);

    println!("bar {cursor} ({})  close {}", prefix[cursor].iso_time(), prefix[cursor].close);
    println!("RSI({}):      {}", params.rsi_period, format_last(&rsi));
    println!(
        "BB({}, {}):   upper {}  middle {}  lower {}",
        params.bollinger_period,
        params.bollinger_stddev,
        format_last(&bb.upper),
        format_last(&bb.middle),
        format_last(&bb.lower)
    );
    println!(
        "MACD({}, {}, {}): macd {}  signal {}  histogram {}",
        params.macd_fast,
        params.macd_slow,
        params.macd_signal,
        format_last(&macd.macd),
        format_last(&macd.signal),
        format_last(&macd.histogram)
    );
    if let Some(period) = ema {
        if period == 0 {
            return fail(ReplayError::invalid("ema period", "must be at least 1"));
        }
        println!("EMA({period}):      {}", format_last(&calculate_ema(prefix, period)));
    }
    ExitCode::SUCCESS
}

fn run_info(bars_path: &Path) -> ExitCode {
    let bars = match load_bars(bars_path, None) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };
    let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let (first, last) = (&bars[0], &bars[bars.len() - 1]);

    println!(
        "{}: {} bars, {} to {}",
        bars_path.display(),
        bars.len(),
        first.iso_time(),
        last.iso_time()
    );
    println!("price range: {low} to {high}");
    ExitCode::SUCCESS
}
