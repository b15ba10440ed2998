//! Configuration system for smbtrace.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $SMBTRACE_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/smbtrace/config.toml
//!   3. ~/.config/smbtrace/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::tool::DEFAULT_DISPLAY_FILTER;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SmbtraceConfig {
    pub tool: ToolConfig,
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Analysis program. A bare name is looked up on PATH.
    pub program: PathBuf,
    /// Upper bound on one invocation, in seconds. 0 = wait forever.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Display filter applied when building the summary listing.
    pub display_filter: String,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("tshark"),
            timeout_secs: 60,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            display_filter: DEFAULT_DISPLAY_FILTER.to_string(),
        }
    }
}

impl ToolConfig {
    /// Invocation time limit, `None` when unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("smbtrace")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl SmbtraceConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            Self::from_toml(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            SmbtraceConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse config text. Missing sections and keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("SMBTRACE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&SmbtraceConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text)
                .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply SMBTRACE_* env var overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SMBTRACE_TOOL__PROGRAM") {
            self.tool.program = PathBuf::from(v);
        }
        if let Some(v) = lookup("SMBTRACE_TOOL__TIMEOUT_SECS") {
            if let Ok(secs) = v.parse() {
                self.tool.timeout_secs = secs;
            }
        }
        if let Some(v) = lookup("SMBTRACE_CAPTURE__DISPLAY_FILTER") {
            self.capture.display_filter = v;
        }
    }
}
