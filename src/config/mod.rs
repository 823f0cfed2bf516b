//! Engine settings and input conf loading.
//!
//! The engine itself never touches the filesystem; this module is the
//! upstream collaborator that turns files into structured rules:
//!
//! - **`EngineConfig`**: runtime settings (rebuild logging, worker name),
//!   loadable from JSON
//! - **`load_input_conf`**: reads an mpv-style `input.conf` (with `~`
//!   expansion) and parses it into `RuleRecord`s
//!
//! # Example
//!
//! ```no_run
//! use layered_keybind_engine::config::load_input_conf;
//! use std::path::Path;
//!
//! let rules = load_input_conf(Path::new("~/.config/mpv/input.conf"))?;
//! println!("Loaded {} rules", rules.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;

pub use error::ConfigError;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::parser::parse_input_conf;
use crate::core::RuleRecord;

/// Runtime settings for a `BindingEngine`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log every section and rule visited during a rebuild, and dump the
    /// enabled bindings afterwards (trace level).
    pub log_bindings_rebuild: bool,

    /// Thread name of the build queue worker.
    pub worker_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_bindings_rebuild: false,
            worker_name: "keybind-build-queue".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parses settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Expands a leading `~` in `path`.
pub fn expand_path(path: &Path) -> Result<PathBuf, ConfigError> {
    let raw = path
        .to_str()
        .ok_or_else(|| ConfigError::InvalidPath(path.to_path_buf()))?;
    Ok(PathBuf::from(shellexpand::tilde(raw).as_ref()))
}

/// Reads and parses an input conf file into rules, in file order.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file doesn't exist, and
/// `ConfigError::Io` if it cannot be read. Malformed lines are skipped,
/// not reported as errors.
pub fn load_input_conf(path: &Path) -> Result<Vec<RuleRecord>, ConfigError> {
    let path = expand_path(path)?;
    if !path.exists() {
        return Err(ConfigError::NotFound(path));
    }

    let content = fs::read_to_string(&path)?;
    let rules = parse_input_conf(&content);
    tracing::debug!(path = %path.display(), count = rules.len(), "Loaded input conf");

    Ok(rules)
}

#[cfg(test)]
mod tests;
