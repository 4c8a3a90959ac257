use thiserror::Error;

use crate::config::ConfigError;

/// Top-level error type for the pulseboard library.
///
/// Probe failures are never reported through this type: they are data,
/// folded into [`crate::ProbeResult`]. Only operations that genuinely cannot
/// proceed return a `PulseError`.
#[derive(Error, Debug)]
pub enum PulseError {
    /// Configuration could not be loaded or is inconsistent.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    /// HTTP client could not be constructed.
    #[error("http: {0}")]
    Http(String),
    /// Index does not address a configured target.
    #[error("unknown target index {0}")]
    UnknownTarget(usize),
    /// A check cycle is already running.
    #[error("a check cycle is already in progress")]
    CycleInProgress,
    /// Nothing to monitor.
    #[error("no targets configured")]
    NoTargets,
    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Other error cases.
    #[error("other: {0}")]
    Other(String),
}

impl From<reqwest::Error> for PulseError {
    fn from(err: reqwest::Error) -> Self {
        PulseError::Http(err.to_string())
    }
}
