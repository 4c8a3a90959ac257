//! Settings file handling.
//!
//! The board is configured from a TOML file. Lookup order: an explicit path,
//! then `$PULSEBOARD_CONFIG_DIR/config.toml`, then the platform config
//! directory (`~/.config/pulseboard/config.toml` on Linux). A missing default
//! file is not an error; an explicit path that does not exist is.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;
pub const MAX_TIMEOUT_SECS: f64 = 3600.0;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("filesystem error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

/// How targets are probed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// Direct HTTP GET with full status visibility.
    #[default]
    Authoritative,
    /// Opaque connectivity check, no status visibility.
    Degraded,
    /// Authoritative checks delegated to an intermediary service.
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub mode: ProbeMode,
    pub timeout_secs: f64,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
    pub intermediary: Option<String>,
    pub secure_origin: bool,
    /// Upper bound on concurrent probes; 0 means unbounded.
    pub max_in_flight: usize,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            mode: ProbeMode::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: true,
            intermediary: None,
            secure_origin: false,
            max_in_flight: 0,
        }
    }
}

impl ProbeSettings {
    /// Per-probe bound. Values that do not fit a `Duration` fall back to the
    /// default; `Settings::validate` rejects them up front.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs)
            .unwrap_or(Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Monitored addresses, in display order.
    pub targets: Vec<String>,
    /// Addresses that start out under maintenance.
    pub suspended: Vec<String>,
    pub probe: ProbeSettings,
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let p = default_path();
                if !p.exists() {
                    return Ok(Self::default());
                }
                p
            }
        };
        let content = fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }

    /// Check cross-field consistency once all overrides are applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeout = self.probe.timeout_secs;
        if !(timeout > 0.0 && timeout <= MAX_TIMEOUT_SECS) {
            return Err(ConfigError::Invalid(format!(
                "timeout must be between 0 and {MAX_TIMEOUT_SECS} seconds, got {timeout}"
            )));
        }
        if self.probe.mode == ProbeMode::Remote && self.probe.intermediary.is_none() {
            return Err(ConfigError::Invalid(
                "remote mode requires an intermediary URL".into(),
            ));
        }
        if let Some(blank) = self.targets.iter().position(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("target #{} is empty", blank + 1)));
        }
        for address in &self.suspended {
            if !self.targets.iter().any(|t| t == address) {
                return Err(ConfigError::Invalid(format!(
                    "suspended address '{address}' is not a configured target"
                )));
            }
        }
        Ok(())
    }
}

pub fn default_path() -> PathBuf {
    resolve_config_dir().join("config.toml")
}

fn resolve_config_dir() -> PathBuf {
    if let Some(val) = env::var_os("PULSEBOARD_CONFIG_DIR") {
        let path = PathBuf::from(val);
        if path.is_absolute() {
            return path;
        }
        return env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| PathBuf::from("."));
    }
    if let Some(base) = dirs::config_dir() {
        return base.join("pulseboard");
    }
    PathBuf::from(".pulseboard")
}
