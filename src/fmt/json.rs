use chrono::Utc;
use serde::Serialize;

use crate::domain::target::{Capability, Progress, Snapshot, TargetStatus};
use crate::error::PulseError;
use crate::stats::Stats;

#[derive(Serialize)]
pub struct JsonTarget<'a> {
    pub url: &'a str,
    pub status: TargetStatus,
    pub suspended: bool,
    pub label: &'static str,
    pub latency_ms: u64,
    pub status_code: u16,
    pub last_check: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'a str>,
}

#[derive(Serialize)]
pub struct JsonBoard<'a> {
    pub schema_version: u8,
    pub run_ts: String,
    pub capability: Capability,
    pub stats: Stats,
    pub progress: Progress,
    pub targets: Vec<JsonTarget<'a>>,
}

/// Serialize a board snapshot into a JSON string.
pub fn to_json(snapshot: &Snapshot, pretty: bool) -> Result<String, PulseError> {
    let targets = snapshot
        .targets
        .iter()
        .map(|t| JsonTarget {
            url: t.address(),
            status: t.status(),
            suspended: t.is_suspended(),
            label: snapshot.capability.label(t.status()),
            latency_ms: t.latency_ms(),
            status_code: t.status_code(),
            last_check: t.last_checked_at().map(|ts| ts.to_rfc3339()),
            detail: t.detail(),
        })
        .collect();
    let board = JsonBoard {
        schema_version: 1,
        run_ts: Utc::now().to_rfc3339(),
        capability: snapshot.capability,
        stats: snapshot.stats,
        progress: snapshot.progress,
        targets,
    };
    let text = if pretty {
        serde_json::to_string_pretty(&board).map_err(|e| PulseError::Other(e.to_string()))?
    } else {
        serde_json::to_string(&board).map_err(|e| PulseError::Other(e.to_string()))?
    };
    Ok(text)
}
