use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::stats::Stats;

/// Lifecycle state of a monitored target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Pending,
    Online,
    Offline,
    Suspended,
}

impl TargetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetStatus::Pending => "Pending",
            TargetStatus::Online => "Online",
            TargetStatus::Offline => "Offline",
            TargetStatus::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a transport is able to observe about a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Real status code, timing and verified transport.
    Authoritative,
    /// Binary reachability only; the status code is a sentinel.
    Degraded,
}

impl Capability {
    pub fn online_label(&self) -> &'static str {
        match self {
            Capability::Authoritative => "Operational",
            Capability::Degraded => "Reachable",
        }
    }

    pub fn offline_label(&self) -> &'static str {
        match self {
            Capability::Authoritative => "Unreachable",
            Capability::Degraded => "Unreachable / Blocked",
        }
    }

    /// Human label for a status as seen through this capability.
    pub fn label(&self, status: TargetStatus) -> &'static str {
        match status {
            TargetStatus::Pending => "Checking...",
            TargetStatus::Online => self.online_label(),
            TargetStatus::Offline => self.offline_label(),
            TargetStatus::Suspended => "Maintenance",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Authoritative => f.write_str("authoritative"),
            Capability::Degraded => f.write_str("degraded"),
        }
    }
}

/// Outcome of a single reachability check. Transports never fail; every
/// failure is described here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub reachable: bool,
    pub status_code: u16,
    pub latency_ms: u64,
    pub error: Option<String>,
    pub status_text: Option<String>,
}

impl ProbeResult {
    pub fn reachable(status_code: u16, latency_ms: u64) -> Self {
        Self {
            reachable: true,
            status_code,
            latency_ms,
            error: None,
            status_text: None,
        }
    }

    /// Server answered, but with a status outside the accepted range.
    pub fn rejected(status_code: u16, latency_ms: u64) -> Self {
        Self {
            reachable: false,
            status_code,
            latency_ms,
            error: None,
            status_text: None,
        }
    }

    /// Transport-level failure: DNS, refused connection, TLS, timeout.
    pub fn failed(error: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            reachable: false,
            status_code: 0,
            latency_ms,
            error: Some(error.into()),
            status_text: None,
        }
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = Some(text.into());
        self
    }

    /// Best description of the outcome for display.
    pub fn detail(&self) -> Option<&str> {
        self.error.as_deref().or(self.status_text.as_deref())
    }
}

/// One monitored endpoint and its current state.
///
/// Suspension is not stored separately from the status, so a target is
/// suspended exactly when its status is [`TargetStatus::Suspended`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    address: String,
    status: TargetStatus,
    last_checked_at: Option<DateTime<Utc>>,
    latency_ms: u64,
    status_code: u16,
    detail: Option<String>,
    generation: u64,
}

impl Target {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            status: TargetStatus::Pending,
            last_checked_at: None,
            latency_ms: 0,
            status_code: 0,
            detail: None,
            generation: 0,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn status(&self) -> TargetStatus {
        self.status
    }

    pub fn is_suspended(&self) -> bool {
        self.status == TargetStatus::Suspended
    }

    pub fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        self.last_checked_at
    }

    pub fn latency_ms(&self) -> u64 {
        self.latency_ms
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_status(&mut self, status: TargetStatus) {
        self.status = status;
    }

    /// Invalidates any probe currently in flight for this target.
    pub(crate) fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub(crate) fn apply(&mut self, update: TargetUpdate) {
        self.status = update.status;
        self.last_checked_at = Some(update.checked_at);
        self.latency_ms = update.latency_ms;
        self.status_code = update.status_code;
        self.detail = update.detail;
    }
}

/// All fields written when a probe completes, applied as one update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetUpdate {
    pub generation: u64,
    pub status: TargetStatus,
    pub checked_at: DateTime<Utc>,
    pub latency_ms: u64,
    pub status_code: u16,
    pub detail: Option<String>,
}

impl TargetUpdate {
    pub fn from_probe(generation: u64, result: &ProbeResult, checked_at: DateTime<Utc>) -> Self {
        Self {
            generation,
            status: if result.reachable {
                TargetStatus::Online
            } else {
                TargetStatus::Offline
            },
            checked_at,
            latency_ms: result.latency_ms,
            status_code: result.status_code,
            detail: result.detail().map(str::to_owned),
        }
    }
}

/// A probe to be issued: which target, at which address, for which
/// generation of that target's state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dispatch {
    pub index: usize,
    pub address: String,
    pub generation: u64,
}

/// Result of flipping a target's maintenance flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SuspendChange {
    /// Target is now frozen; nothing is probed.
    Suspended,
    /// Target is back to Pending and needs exactly this re-probe.
    Resumed(Dispatch),
}

/// Progress of the current (or last) check cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub running: bool,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Read-only view of the board handed to presentation layers.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub targets: Vec<Target>,
    pub stats: Stats,
    pub progress: Progress,
    pub capability: Capability,
}

/// Board filter: `All` shows everything; the others hide suspended targets
/// and show only the matching status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Online,
    Offline,
}

impl Filter {
    pub fn matches(&self, target: &Target) -> bool {
        match self {
            Filter::All => true,
            Filter::Online => target.status() == TargetStatus::Online,
            Filter::Offline => target.status() == TargetStatus::Offline,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Online,
            Filter::Online => Filter::Offline,
            Filter::Offline => Filter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Online => "Online",
            Filter::Offline => "Offline",
        }
    }
}
