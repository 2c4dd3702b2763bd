//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use logging_proxy::config::{LogStoreBackend, ProxyConfig};
use logging_proxy::store::{LogStore, MemoryLogStore};
use logging_proxy::{HttpServer, Shutdown};

/// A request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct RawRequest {
    /// Request line and headers, without the terminating blank line.
    pub head: String,
    pub body: Vec<u8>,
}

impl RawRequest {
    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }

    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or("")
    }
}

/// Read one HTTP/1.1 request (head plus `Content-Length` body).
pub async fn read_request(socket: &mut TcpStream) -> Option<RawRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut request = RawRequest { head, body: Vec::new() };
    let length: usize = request
        .header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    request.body = body;
    Some(request)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        302 => "Found",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Serialize a response with `Connection: close` and an exact length.
pub fn raw_response(status: u16, headers: &[(&str, &str)], body: &str) -> String {
    let mut out = format!("HTTP/1.1 {} {}\r\n", status, reason(status));
    for (name, value) in headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    out
}

/// Start a backend that answers every request with `respond(request)`.
pub async fn start_programmable_backend<F, Fut>(respond: F) -> SocketAddr
where
    F: Fn(RawRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = String> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let respond = respond.clone();
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut socket).await {
                    let response = respond(request).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });
        }
    });

    addr
}

/// Echo backend: the body is the request line, headers and body it received.
///
/// Responses also carry hop-by-hop headers the proxy must drop, plus
/// `X-Upstream: echo`.
pub async fn start_echo_backend() -> SocketAddr {
    start_programmable_backend(|request| async move {
        let body = format!(
            "{}\r\n\r\n{}",
            request.head,
            String::from_utf8_lossy(&request.body)
        );
        raw_response(
            200,
            &[
                ("Content-Type", "text/plain"),
                ("Keep-Alive", "timeout=5"),
                ("Proxy-Authenticate", "Basic realm=\"upstream\""),
                ("X-Upstream", "echo"),
            ],
            &body,
        )
    })
    .await
}

/// Proxy config pointing at `target`, logging to memory.
pub fn proxy_config(target: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.target_url = Some(target.to_string());
    config.log_store.backend = LogStoreBackend::Memory;
    config.timeouts.request_secs = 5;
    config
}

pub fn memory_store() -> Arc<dyn LogStore> {
    Arc::new(MemoryLogStore::new())
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(mut config: ProxyConfig, store: Arc<dyn LogStore>) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let server = HttpServer::new(config, store).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// HTTP client that never pools connections or follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
