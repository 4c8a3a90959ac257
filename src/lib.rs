//! pulseboard library: concurrent reachability checks over a fixed set of
//! URLs, reconciled into a status board with counts and CSV export.

pub mod adapters;
pub mod config;
pub mod domain;
mod error;
pub mod fmt;
pub mod services;
pub mod stats;
#[cfg(feature = "tui")]
pub mod tui;

pub use adapters::{Transport, build_transport};
pub use config::{ProbeMode, ProbeSettings, Settings};
pub use domain::target::{
    Capability, Filter, ProbeResult, Progress, Snapshot, SuspendChange, Target, TargetStatus,
};
pub use error::PulseError;
pub use services::orchestrator::{CycleReport, Monitor};
pub use services::registry::TargetRegistry;
