use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

use super::{Transport, describe_error, elapsed_ms};
use crate::domain::target::{Capability, ProbeResult};
use crate::error::PulseError;

/// Body sent to the intermediary's check endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub url: String,
}

/// Intermediary reply. On transport failure `status` is 0, `ok` is false and
/// `error` is set; otherwise `statusText` carries the reason phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub url: String,
    pub status: u16,
    pub ok: bool,
    pub duration: u64,
    #[serde(rename = "statusText", default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResponse {
    /// Convert to a probe result; `round_trip_ms` stands in for the latency
    /// when the intermediary could not time the request itself.
    pub fn into_result(self, round_trip_ms: u64) -> ProbeResult {
        if let Some(error) = self.error {
            return ProbeResult::failed(error, round_trip_ms);
        }
        let result = if self.ok {
            ProbeResult::reachable(self.status, self.duration)
        } else {
            ProbeResult::rejected(self.status, self.duration)
        };
        match self.status_text {
            Some(text) if !text.is_empty() => result.with_status_text(text),
            _ => result,
        }
    }
}

/// Authoritative transport that delegates each check to an intermediary
/// service (`POST {base}/api/check`).
pub struct RemoteProbe {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteProbe {
    /// `timeout` bounds the whole exchange; the intermediary applies its own
    /// bound to the upstream request, so allow a little more here.
    pub fn new(base: &str, timeout: Duration) -> Result<Self, PulseError> {
        let client = reqwest::Client::builder()
            .timeout(timeout.saturating_add(Duration::from_secs(2)))
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/check", base.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn exchange(&self, address: &str) -> Result<ProbeResponse, reqwest::Error> {
        self.client
            .post(&self.endpoint)
            .json(&ProbeRequest {
                url: address.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json::<ProbeResponse>()
            .await
    }
}

#[async_trait::async_trait]
impl Transport for RemoteProbe {
    fn capability(&self) -> Capability {
        Capability::Authoritative
    }

    #[instrument(skip(self))]
    async fn probe(&self, address: &str) -> ProbeResult {
        let start = Instant::now();
        match self.exchange(address).await {
            Ok(response) => response.into_result(elapsed_ms(start)),
            Err(err) => {
                let message = format!("intermediary unavailable: {}", describe_error(&err));
                debug!(endpoint = %self.endpoint, error = %message);
                ProbeResult::failed(message, elapsed_ms(start))
            }
        }
    }
}
