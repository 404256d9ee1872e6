//! INI file configuration adapter.

use crate::domain::error::ReplayError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| ReplayError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ReplayError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ReplayError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// A string value with surrounding whitespace removed; blank counts as unset.
    pub fn get_trimmed(&self, section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
path = data/es.json

[replay]
tick_ms = 250
trade_size = 2.5

[quiz]
model = gpt-4o-mini
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "path"),
            Some("data/es.json".to_string())
        );
        assert_eq!(adapter.get_int("replay", "tick_ms", 500), 250);
        assert_eq!(adapter.get_double("replay", "trade_size", 1.0), 2.5);
        assert_eq!(
            adapter.get_string("quiz", "model"),
            Some("gpt-4o-mini".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[replay]\ntick_ms = 100\n").unwrap();
        assert_eq!(adapter.get_string("replay", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[replay]\n").unwrap();
        assert_eq!(adapter.get_int("replay", "quiz_window", 14), 14);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[replay]\ntick_ms = fast\n").unwrap();
        assert_eq!(adapter.get_int("replay", "tick_ms", 500), 500);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[studies]\nbollinger_stddev = wide\n").unwrap();
        assert_eq!(adapter.get_double("studies", "bollinger_stddev", 2.0), 2.0);
    }

    #[test]
    fn get_bool_accepts_common_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[studies]\nrsi = yes\nbollinger = 0\nmacd = TRUE\n")
                .unwrap();
        assert!(adapter.get_bool("studies", "rsi", false));
        assert!(!adapter.get_bool("studies", "bollinger", true));
        assert!(adapter.get_bool("studies", "macd", false));
    }

    #[test]
    fn get_bool_returns_default_for_garbage() {
        let adapter = FileConfigAdapter::from_string("[studies]\nrsi = maybe\n").unwrap();
        assert!(adapter.get_bool("studies", "rsi", true));
        assert!(!adapter.get_bool("studies", "rsi", false));
    }

    #[test]
    fn get_trimmed_treats_blank_as_unset() {
        let adapter =
            FileConfigAdapter::from_string("[render]\nframes_path =\n[quiz]\nurl = x\n").unwrap();
        assert_eq!(adapter.get_trimmed("render", "frames_path"), None);
        assert_eq!(adapter.get_trimmed("quiz", "url"), Some("x".to_string()));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[render]\nframes_path = /tmp/frames.jsonl\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("render", "frames_path"),
            Some("/tmp/frames.jsonl".to_string())
        );
    }

    #[test]
    fn from_file_reports_parse_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/replay.ini");
        assert!(matches!(result, Err(ReplayError::ConfigParse { .. })));
    }
}
