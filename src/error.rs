//! Error types for the keyspace search engine
//!
//! Running out of keyspace, exhausting a packet and cancellation are search
//! states, not errors. The types here only cover bad inputs and I/O around
//! configuration.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration and argument validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Alphabet must contain at least one symbol")]
    EmptyAlphabet,

    #[error("Alphabet symbol {0:?} appears more than once")]
    DuplicateSymbol(char),

    #[error("Alphabet symbol {0:?} is not printable ASCII")]
    NonAsciiSymbol(char),

    #[error("Unknown character set preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid packet capacity: {0}. Must be greater than 0")]
    InvalidPacketCapacity(i64),

    #[error("Invalid maximum password length: {0}. Must be greater than 0")]
    InvalidMaxLength(usize),

    #[error("Invalid password length: {0}. Must be greater than 0")]
    InvalidLength(usize),

    #[error("Invalid worker count: {0}. Must be greater than 0")]
    InvalidWorkerCount(usize),

    #[error("Invalid window size: {0}. Must be greater than 0")]
    InvalidWindowSize(usize),

    #[error("Invalid MD5 digest: {0}")]
    InvalidDigest(String),

    #[error("Invalid node count: {0}. Must be greater than 0")]
    InvalidNodeCount(usize),

    #[error("Node index {index} out of range for {total} nodes")]
    NodeIndexOutOfRange { index: usize, total: usize },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SearchError>;

impl From<rayon::ThreadPoolBuildError> for SearchError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        SearchError::Internal(format!("worker pool: {err}"))
    }
}
