//! Configuration types and parsing for keyspace searches

use crate::alphabet::{Alphabet, FULL_SYMBOLS};
use crate::error::{ConfigError, Result};
use crate::packet::{DEFAULT_MAX_PASSWORD_LENGTH, DEFAULT_PACKET_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for a search session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    /// Ordered candidate symbols (defaults to the 95-symbol set)
    #[serde(default = "default_alphabet")]
    pub alphabet: String,

    /// Positions per job packet
    #[serde(default = "default_packet_capacity")]
    pub packet_capacity: i64,

    /// Longest password length the scheduler hands out
    #[serde(default = "default_max_password_length")]
    pub max_password_length: usize,

    /// Worker threads per batch (defaults to the number of CPUs)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Positions each worker probes per batch window
    #[serde(default = "default_window_per_worker")]
    pub window_per_worker: usize,

    /// Whether to draw a progress bar
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,

    /// Minimum interval between attempts-per-second samples
    #[serde(default = "default_rate_sample_ms")]
    pub rate_sample_ms: u64,
}

fn default_alphabet() -> String {
    FULL_SYMBOLS.to_string()
}

fn default_packet_capacity() -> i64 {
    DEFAULT_PACKET_CAPACITY
}

fn default_max_password_length() -> usize {
    DEFAULT_MAX_PASSWORD_LENGTH
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_window_per_worker() -> usize {
    crate::DEFAULT_WINDOW_PER_WORKER
}

fn default_show_progress() -> bool {
    true
}

fn default_rate_sample_ms() -> u64 {
    1000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            alphabet: default_alphabet(),
            packet_capacity: default_packet_capacity(),
            max_password_length: default_max_password_length(),
            workers: default_workers(),
            window_per_worker: default_window_per_worker(),
            show_progress: default_show_progress(),
            rate_sample_ms: default_rate_sample_ms(),
        }
    }
}

impl SearchConfig {
    /// Load configuration from a file; `.toml` files are read as TOML, anything else as JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: SearchConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration; format follows the file extension like [`from_file`](Self::from_file)
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let text = if is_toml {
            toml::to_string_pretty(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        Alphabet::new(&self.alphabet)?;

        if self.packet_capacity <= 0 {
            return Err(ConfigError::InvalidPacketCapacity(self.packet_capacity).into());
        }
        if self.max_password_length == 0 {
            return Err(ConfigError::InvalidMaxLength(self.max_password_length).into());
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkerCount(self.workers).into());
        }
        if self.window_per_worker == 0 {
            return Err(ConfigError::InvalidWindowSize(self.window_per_worker).into());
        }

        Ok(())
    }

    /// The configured alphabet
    pub fn build_alphabet(&self) -> Result<Alphabet> {
        Alphabet::new(&self.alphabet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;

    #[test]
    fn test_defaults_match_reference_constants() {
        let config = SearchConfig::default();
        assert_eq!(config.alphabet.len(), 95);
        assert_eq!(config.packet_capacity, 60_000);
        assert_eq!(config.max_password_length, 8);
        assert_eq!(config.window_per_worker, 100);
        assert!(config.workers >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_uses_defaults_for_missing_fields() {
        let config = SearchConfig::from_json(r#"{ "alphabet": "abc", "workers": 3 }"#).unwrap();
        assert_eq!(config.alphabet, "abc");
        assert_eq!(config.workers, 3);
        assert_eq!(config.packet_capacity, 60_000);
        assert!(config.show_progress);
    }

    #[test]
    fn test_toml_parsing() {
        let text = r#"
alphabet = "0123456789"
packet_capacity = 500
max_password_length = 4
workers = 2
window_per_worker = 10
show_progress = false
"#;
        let config = SearchConfig::from_toml(text).unwrap();
        assert_eq!(config.packet_capacity, 500);
        assert_eq!(config.max_password_length, 4);
        assert_eq!(config.workers, 2);
        assert_eq!(config.window_per_worker, 10);
        assert!(!config.show_progress);
        assert_eq!(config.build_alphabet().unwrap().len(), 10);
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            (r#"{ "alphabet": "" }"#, ConfigError::EmptyAlphabet),
            (r#"{ "alphabet": "aa" }"#, ConfigError::DuplicateSymbol('a')),
            (r#"{ "packet_capacity": 0 }"#, ConfigError::InvalidPacketCapacity(0)),
            (r#"{ "max_password_length": 0 }"#, ConfigError::InvalidMaxLength(0)),
            (r#"{ "workers": 0 }"#, ConfigError::InvalidWorkerCount(0)),
            (r#"{ "window_per_worker": 0 }"#, ConfigError::InvalidWindowSize(0)),
        ];

        for (json, expected) in cases {
            match SearchConfig::from_json(json) {
                Err(SearchError::Config(err)) => assert_eq!(err, expected, "for {json}"),
                other => panic!("expected config error for {json}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = SearchConfig {
            alphabet: "xyz".to_string(),
            workers: 2,
            ..SearchConfig::default()
        };

        for name in ["search.json", "search.toml"] {
            let path = dir.path().join(name);
            config.to_file(&path).unwrap();
            assert_eq!(SearchConfig::from_file(&path).unwrap(), config);
        }

        assert!(matches!(
            SearchConfig::from_file(dir.path().join("missing.json")),
            Err(SearchError::Io(_))
        ));
    }
}
