#![allow(dead_code)]

use pulseboard::{Capability, ProbeResult, Transport};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

/// Transport answering from a fixed table; unknown addresses fail.
/// Addresses listed in `held` wait for `release` before answering.
pub struct Scripted {
    pub capability: Capability,
    pub answers: HashMap<String, ProbeResult>,
    pub held: Vec<String>,
    pub release: Arc<Notify>,
    pub calls: AtomicUsize,
}

impl Scripted {
    pub fn new(answers: &[(&str, ProbeResult)]) -> Self {
        Self {
            capability: Capability::Authoritative,
            answers: answers
                .iter()
                .map(|(a, r)| (a.to_string(), r.clone()))
                .collect(),
            held: Vec::new(),
            release: Arc::new(Notify::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn holding(mut self, address: &str) -> Self {
        self.held.push(address.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for Scripted {
    fn capability(&self) -> Capability {
        self.capability
    }

    async fn probe(&self, address: &str) -> ProbeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.held.iter().any(|h| h == address) {
            self.release.notified().await;
        }
        self.answers
            .get(address)
            .cloned()
            .unwrap_or_else(|| ProbeResult::failed("no route to host", 1))
    }
}

/// Read one HTTP request (headers plus Content-Length body) and return its
/// body.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(Vec::new());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let length = headers
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(buf[header_end..].to_vec())
}

/// Serve every connection with the response produced by `respond(body)`,
/// given as `(status line, content type, body)`.
pub async fn serve<F>(respond: F) -> SocketAddr
where
    F: Fn(Vec<u8>) -> (&'static str, &'static str, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let respond = Arc::new(respond);
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let respond = Arc::clone(&respond);
            tokio::spawn(async move {
                let Ok(body) = read_request(&mut stream).await else {
                    return;
                };
                let (status, content_type, payload) = respond(body);
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
                    payload.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    addr
}

/// Plain server always answering with `status`.
pub async fn serve_status(status: &'static str) -> SocketAddr {
    serve(move |_| (status, "text/plain", "hello".to_string())).await
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
