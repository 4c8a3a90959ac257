use std::time::{Duration, Instant};

use reqwest::header::CACHE_CONTROL;
use tracing::{debug, instrument};

use super::{Transport, describe_error, elapsed_ms};
use crate::domain::target::{Capability, ProbeResult};
use crate::error::PulseError;

/// Status code reported for any settled degraded probe. It carries no
/// information about the real response.
pub const SENTINEL_STATUS: u16 = 200;

/// Degraded transport: connects to the literal address and only learns
/// whether the attempt settled. The response status is deliberately ignored,
/// so an erroring server still reads as reachable.
pub struct DirectProbe {
    client: reqwest::Client,
    secure_origin: bool,
}

impl DirectProbe {
    pub fn new(timeout: Duration) -> Result<Self, PulseError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            secure_origin: false,
        })
    }

    /// Refuse plain-http targets, as a page served over https would.
    pub fn with_secure_origin(mut self, secure_origin: bool) -> Self {
        self.secure_origin = secure_origin;
        self
    }

    fn blocked(&self, address: &str) -> bool {
        self.secure_origin && address.trim().to_ascii_lowercase().starts_with("http://")
    }
}

#[async_trait::async_trait]
impl Transport for DirectProbe {
    fn capability(&self) -> Capability {
        Capability::Degraded
    }

    #[instrument(skip(self))]
    async fn probe(&self, address: &str) -> ProbeResult {
        if self.blocked(address) {
            debug!("blocked by mixed-content rule");
            return ProbeResult::failed("blocked: insecure target from a secure origin", 0);
        }

        let start = Instant::now();
        let request = self
            .client
            .get(address.trim())
            .header(CACHE_CONTROL, "no-store");

        match request.send().await {
            Ok(_) => ProbeResult::reachable(SENTINEL_STATUS, elapsed_ms(start))
                .with_status_text("Reachable"),
            Err(err) => {
                let message = describe_error(&err);
                debug!(error = %message, "connection failed");
                ProbeResult::failed(message, elapsed_ms(start))
            }
        }
    }
}
