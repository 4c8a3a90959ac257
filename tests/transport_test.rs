mod common;

use common::{closed_port, serve, serve_status};
use pulseboard::adapters::direct_probe::{DirectProbe, SENTINEL_STATUS};
use pulseboard::adapters::http_probe::HttpProbe;
use pulseboard::adapters::remote_probe::{ProbeRequest, RemoteProbe};
use pulseboard::{Capability, Monitor, TargetRegistry, TargetStatus, Transport};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(3);

fn http_probe() -> HttpProbe {
    HttpProbe::new(TIMEOUT, "pulseboard-test", true).unwrap()
}

#[tokio::test]
async fn authoritative_reports_real_status() {
    let addr = serve_status("200 OK").await;
    let result = http_probe().probe(&format!("http://{addr}/")).await;
    assert!(result.reachable);
    assert_eq!(result.status_code, 200);
    assert_eq!(result.status_text.as_deref(), Some("OK"));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn authoritative_marks_client_errors_offline() {
    let addr = serve_status("404 Not Found").await;
    let monitor = Monitor::new(
        TargetRegistry::from_addresses([format!("http://{addr}/missing")]),
        Arc::new(http_probe()),
    );
    monitor.run_cycle().await.unwrap();

    let snap = monitor.snapshot().await;
    assert_eq!(snap.capability, Capability::Authoritative);
    assert_eq!(snap.targets[0].status(), TargetStatus::Offline);
    assert_eq!(snap.targets[0].status_code(), 404);
    assert_eq!(snap.targets[0].detail(), Some("Not Found"));
}

#[tokio::test]
async fn authoritative_connection_refused_has_no_code() {
    let addr = closed_port().await;
    let result = http_probe().probe(&format!("http://{addr}/")).await;
    assert!(!result.reachable);
    assert_eq!(result.status_code, 0);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn degraded_cannot_see_server_errors() {
    let addr = serve_status("500 Internal Server Error").await;
    let probe = DirectProbe::new(TIMEOUT).unwrap();
    assert_eq!(probe.capability(), Capability::Degraded);

    let result = probe.probe(&format!("http://{addr}/")).await;
    assert!(result.reachable);
    assert_eq!(result.status_code, SENTINEL_STATUS);
}

#[tokio::test]
async fn degraded_connection_refused_is_offline() {
    let addr = closed_port().await;
    let result = DirectProbe::new(TIMEOUT)
        .unwrap()
        .probe(&format!("http://{addr}/"))
        .await;
    assert!(!result.reachable);
    assert_eq!(result.status_code, 0);
}

#[tokio::test]
async fn remote_relays_intermediary_verdict() {
    let addr = serve(|body| {
        let request: ProbeRequest = serde_json::from_slice(&body).unwrap();
        let reply = if request.url.contains("down") {
            serde_json::json!({
                "url": request.url, "status": 0, "ok": false,
                "error": "getaddrinfo ENOTFOUND down.example.com", "duration": 0
            })
        } else {
            serde_json::json!({
                "url": request.url, "status": 301, "ok": true,
                "duration": 55, "statusText": "Moved Permanently"
            })
        };
        ("200 OK", "application/json", reply.to_string())
    })
    .await;

    let probe = RemoteProbe::new(&format!("http://{addr}"), TIMEOUT).unwrap();
    let up = probe.probe("www.example.com").await;
    assert!(up.reachable);
    assert_eq!(up.status_code, 301);
    assert_eq!(up.latency_ms, 55);
    assert_eq!(up.detail(), Some("Moved Permanently"));

    let down = probe.probe("down.example.com").await;
    assert!(!down.reachable);
    assert_eq!(down.status_code, 0);
    assert!(down.error.unwrap().contains("ENOTFOUND"));
}

#[tokio::test]
async fn remote_without_intermediary_fails_probe() {
    let addr = closed_port().await;
    let probe = RemoteProbe::new(&format!("http://{addr}"), TIMEOUT).unwrap();
    let result = probe.probe("www.example.com").await;
    assert!(!result.reachable);
    assert_eq!(result.status_code, 0);
    assert!(
        result
            .error
            .unwrap()
            .starts_with("intermediary unavailable")
    );
}

#[tokio::test]
async fn remote_rejects_intermediary_error_status() {
    let addr = serve_status("502 Bad Gateway").await;
    let probe = RemoteProbe::new(&format!("http://{addr}"), TIMEOUT).unwrap();
    let result = probe.probe("www.example.com").await;
    assert!(!result.reachable);
    assert_eq!(result.status_code, 0);
}

#[cfg(feature = "network-tests")]
mod network {
    use super::*;

    #[tokio::test]
    async fn authoritative_public_site() {
        let result = http_probe().probe("www.example.com").await;
        assert!(result.reachable, "{:?}", result);
    }

    #[tokio::test]
    async fn degraded_public_site() {
        let result = DirectProbe::new(TIMEOUT)
            .unwrap()
            .probe("https://www.example.com")
            .await;
        assert!(result.reachable, "{:?}", result);
    }
}
