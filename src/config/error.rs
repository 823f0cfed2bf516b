use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Input conf file does not exist.
    #[error("Input conf file not found: {0}")]
    NotFound(PathBuf),
    /// Path is not valid UTF-8, so `~` cannot be expanded.
    #[error("Invalid path encoding: {0}")]
    InvalidPath(PathBuf),
    /// Engine settings are not valid JSON for `EngineConfig`.
    #[error("Invalid engine settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),
    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
