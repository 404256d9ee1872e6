//! Configuration validation.
//!
//! Validates all config fields before a replay session starts.

use crate::domain::error::ReplayError;
use crate::ports::bar_port::BarFormat;
use crate::ports::config_port::ConfigPort;
use crate::ports::quiz_port::QuizProvider;

pub fn validate_replay_config(config: &dyn ConfigPort) -> Result<(), ReplayError> {
    validate_data(config)?;
    validate_replay(config)?;
    validate_studies(config)?;
    validate_quiz(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> ReplayError {
    ReplayError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> ReplayError {
    ReplayError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

/// The integer at `section.key`, or `default` when unset. A value that
/// does not parse is an error instead of a silent fallback.
fn int_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, ReplayError> {
    match config.get_string(section, key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| invalid(section, key, format!("'{raw}' is not an integer"))),
        _ => Ok(default),
    }
}

fn double_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, ReplayError> {
    match config.get_string(section, key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| invalid(section, key, format!("'{raw}' is not a number"))),
        _ => Ok(default),
    }
}

fn check_bool(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), ReplayError> {
    match config.get_string(section, key) {
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "" | "true" | "yes" | "1" | "false" | "no" | "0" => Ok(()),
            _ => Err(invalid(section, key, format!("'{raw}' is not a boolean"))),
        },
        None => Ok(()),
    }
}

fn check_http_url(config: &dyn ConfigPort, key: &str) -> Result<bool, ReplayError> {
    match config.get_string("quiz", key) {
        Some(u) if u.trim().is_empty() => Ok(false),
        Some(u) if u.starts_with("http://") || u.starts_with("https://") => Ok(true),
        Some(_) => Err(invalid("quiz", key, format!("{key} must start with http:// or https://"))),
        None => Ok(false),
    }
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), ReplayError> {
    match config.get_string("data", "path") {
        Some(p) if !p.trim().is_empty() => {}
        _ => return Err(missing("data", "path")),
    }
    if let Some(format) = config.get_string("data", "format") {
        format
            .parse::<BarFormat>()
            .map_err(|reason| invalid("data", "format", reason))?;
    }
    Ok(())
}

fn validate_replay(config: &dyn ConfigPort) -> Result<(), ReplayError> {
    if int_value(config, "replay", "tick_ms", 500)? <= 0 {
        return Err(invalid("replay", "tick_ms", "tick_ms must be positive"));
    }
    let size = double_value(config, "replay", "trade_size", 1.0)?;
    if !(size.is_finite() && size > 0.0) {
        return Err(invalid("replay", "trade_size", "trade_size must be positive"));
    }
    if int_value(config, "replay", "quiz_window", 14)? < 1 {
        return Err(invalid(
            "replay",
            "quiz_window",
            "quiz_window must be at least 1",
        ));
    }
    Ok(())
}

fn validate_studies(config: &dyn ConfigPort) -> Result<(), ReplayError> {
    for key in ["rsi", "bollinger", "macd"] {
        check_bool(config, "studies", key)?;
    }

    for (key, default) in [
        ("rsi_period", 14),
        ("bollinger_period", 20),
        ("macd_fast", 12),
        ("macd_slow", 26),
        ("macd_signal", 9),
    ] {
        if int_value(config, "studies", key, default)? < 1 {
            return Err(invalid("studies", key, format!("{key} must be at least 1")));
        }
    }

    let stddev = double_value(config, "studies", "bollinger_stddev", 2.0)?;
    if !(stddev.is_finite() && stddev > 0.0) {
        return Err(invalid(
            "studies",
            "bollinger_stddev",
            "bollinger_stddev must be positive",
        ));
    }

    let fast = int_value(config, "studies", "macd_fast", 12)?;
    let slow = int_value(config, "studies", "macd_slow", 26)?;
    if fast >= slow {
        return Err(invalid(
            "studies",
            "macd_fast",
            "macd_fast must be less than macd_slow",
        ));
    }
    Ok(())
}

fn validate_quiz(config: &dyn ConfigPort) -> Result<(), ReplayError> {
    let provider = match config.get_string("quiz", "provider") {
        Some(p) => p
            .parse::<QuizProvider>()
            .map_err(|reason| invalid("quiz", "provider", reason))?,
        None => QuizProvider::Disabled,
    };
    if provider == QuizProvider::Disabled {
        return Ok(());
    }

    if int_value(config, "quiz", "timeout_secs", 30)? <= 0 {
        return Err(invalid("quiz", "timeout_secs", "timeout_secs must be positive"));
    }

    match provider {
        QuizProvider::Service => {
            if check_http_url(config, "url")? {
                Ok(())
            } else {
                Err(missing("quiz", "url"))
            }
        }
        QuizProvider::OpenAi => {
            check_http_url(config, "base_url")?;
            let temperature = double_value(config, "quiz", "temperature", 0.6)?;
            if !(0.0..=2.0).contains(&temperature) {
                return Err(invalid(
                    "quiz",
                    "temperature",
                    "temperature must be between 0 and 2",
                ));
            }
            match config.get_string("quiz", "model") {
                Some(model) if model.trim().is_empty() => {
                    Err(invalid("quiz", "model", "model must not be empty"))
                }
                _ => Ok(()),
            }
        }
        QuizProvider::Disabled => Ok(()),
    }
}
