//! Probe transports.
//!
//! A transport performs one reachability check against one address and never
//! fails: every outcome, including transport errors, comes back as a
//! [`ProbeResult`]. The transport is picked once at startup from
//! [`ProbeSettings`] and shared by the orchestrator.

pub mod direct_probe;
pub mod http_probe;
pub mod remote_probe;

use std::error::Error as StdError;
use std::sync::Arc;

use crate::config::{ProbeMode, ProbeSettings};
use crate::domain::target::{Capability, ProbeResult};
use crate::error::PulseError;

pub use direct_probe::DirectProbe;
pub use http_probe::HttpProbe;
pub use remote_probe::RemoteProbe;

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// What this transport can observe, used for labeling only.
    fn capability(&self) -> Capability;

    /// Check `address` once.
    async fn probe(&self, address: &str) -> ProbeResult;
}

/// Build the transport described by `settings`.
pub fn build_transport(settings: &ProbeSettings) -> Result<Arc<dyn Transport>, PulseError> {
    let transport: Arc<dyn Transport> = match settings.mode {
        ProbeMode::Authoritative => Arc::new(HttpProbe::new(
            settings.timeout(),
            &settings.user_agent,
            settings.accept_invalid_certs,
        )?),
        ProbeMode::Degraded => Arc::new(
            DirectProbe::new(settings.timeout())?.with_secure_origin(settings.secure_origin),
        ),
        ProbeMode::Remote => {
            let base = settings.intermediary.as_deref().ok_or_else(|| {
                PulseError::Other("remote mode requires an intermediary URL".into())
            })?;
            Arc::new(RemoteProbe::new(base, settings.timeout())?)
        }
    };
    Ok(transport)
}

/// Flatten a reqwest error and its sources into one line, since the top
/// level message alone ("error sending request") says little.
pub(crate) fn describe_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        return "request timed out".to_string();
    }
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}

pub(crate) fn elapsed_ms(start: std::time::Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
