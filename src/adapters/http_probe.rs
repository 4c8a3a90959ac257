use std::time::{Duration, Instant};

use tracing::{debug, instrument};

use super::{Transport, describe_error, elapsed_ms};
use crate::domain::target::{Capability, ProbeResult};
use crate::error::PulseError;

/// Prefix `https://` when the address carries no http(s) scheme.
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Statuses in [200, 400) count as up; redirects are fine for uptime.
pub fn is_up_status(code: u16) -> bool {
    (200..400).contains(&code)
}

/// Authoritative transport: a plain HTTP GET with full visibility of the
/// response status and timing.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(
        timeout: Duration,
        user_agent: &str,
        accept_invalid_certs: bool,
    ) -> Result<Self, PulseError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .user_agent(user_agent)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Transport for HttpProbe {
    fn capability(&self) -> Capability {
        Capability::Authoritative
    }

    #[instrument(skip(self))]
    async fn probe(&self, address: &str) -> ProbeResult {
        let url = normalize_address(address);
        let start = Instant::now();

        match self.client.get(&url).send().await {
            Ok(response) => {
                let latency = elapsed_ms(start);
                let status = response.status();
                let code = status.as_u16();
                let reason = status.canonical_reason().unwrap_or("");
                debug!(%url, code, latency, "response received");
                let result = if is_up_status(code) {
                    ProbeResult::reachable(code, latency)
                } else {
                    ProbeResult::rejected(code, latency)
                };
                if reason.is_empty() {
                    result
                } else {
                    result.with_status_text(reason)
                }
            }
            Err(err) => {
                let latency = elapsed_ms(start);
                let message = describe_error(&err);
                debug!(%url, error = %message, "transport failure");
                ProbeResult::failed(message, latency)
            }
        }
    }
}
