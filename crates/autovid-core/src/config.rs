//! Persistent configuration for autovid.
//!
//! Settings live in `~/.autovid/config.json`: where the accessibility agent
//! listens and the recording [`Pacing`].
//!
//! # Example
//!
//! ```no_run
//! use autovid_core::config::AutovidConfig;
//!
//! // Load (returns defaults if the file doesn't exist)
//! let config = AutovidConfig::load();
//! println!("agent at {}:{}", config.agent_host, config.agent_port);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pacing::Pacing;

const CONFIG_FILENAME: &str = "config.json";

/// Errors from locating the configuration directory.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Returns `~/.autovid`, creating it if needed.
pub fn autovid_dir() -> Result<PathBuf, ConfigError> {
    let dir = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?.join(".autovid");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Persistent autovid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutovidConfig {
    /// Host the accessibility agent listens on.
    pub agent_host: String,
    /// Port the accessibility agent listens on.
    pub agent_port: u16,
    /// Delays used while recording.
    pub pacing: Pacing,
}

impl Default for AutovidConfig {
    fn default() -> Self {
        Self {
            agent_host: "localhost".to_string(),
            agent_port: 8080,
            pacing: Pacing::default(),
        }
    }
}

impl AutovidConfig {
    /// Load `~/.autovid/config.json`.
    ///
    /// Returns [`Default`] if the file is missing or cannot be parsed.
    pub fn load() -> Self {
        match autovid_dir() {
            Ok(dir) => Self::load_from(&dir.join(CONFIG_FILENAME)),
            Err(_) => Self::default(),
        }
    }

    /// Load from an explicit path, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }
}
