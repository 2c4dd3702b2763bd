//! The forwarding engine.
//!
//! # Responsibilities
//! - Resolve the upstream target and TLS verification for a request
//! - Record POST requests in the request log
//! - Build and send the upstream request (no redirect following)
//! - Relay status, headers and body of the upstream response
//!
//! # Design Decisions
//! - Two clients built at startup: one verifying certificates, one not
//! - The timeout covers the whole upstream exchange, body included
//! - Logging happens before the upstream call so it is independent of its outcome

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::redirect;

use crate::config::{TlsVerifyPolicy, UpstreamConfig};
use crate::forward::body::RequestBody;
use crate::forward::error::{ForwardError, SetupError};
use crate::forward::target::{should_verify, TargetResolver};
use crate::security::headers::strip_hop_by_hop;
use crate::store::{NewLogRecord, RequestLog};

/// One request as received from a caller.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Path without the query string.
    pub path: String,
    /// Raw query string, forwarded verbatim.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub client_addr: SocketAddr,
}

/// The upstream's answer, ready to relay.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Forwards inbound requests to the configured upstream.
pub struct Forwarder {
    targets: TargetResolver,
    tls_verify: TlsVerifyPolicy,
    verifying: reqwest::Client,
    insecure: reqwest::Client,
    log: RequestLog,
}

impl Forwarder {
    pub fn new(upstream: &UpstreamConfig, timeout: Duration, log: RequestLog) -> Result<Self, SetupError> {
        let targets = TargetResolver::from_config(upstream)?;

        let verifying = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .no_proxy()
            .build()?;

        let insecure = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .no_proxy()
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            targets,
            tls_verify: upstream.tls_verify,
            verifying,
            insecure,
            log,
        })
    }

    pub fn targets(&self) -> &TargetResolver {
        &self.targets
    }

    /// Full upstream URL for a request.
    pub fn target_url(&self, request: &InboundRequest) -> String {
        let referer = request
            .headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok());

        let mut url = format!("{}{}", self.targets.resolve(referer), request.path);
        if let Some(query) = request.query.as_deref().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// Forward one request and return the upstream response.
    pub async fn forward(&self, request: InboundRequest) -> Result<UpstreamResponse, ForwardError> {
        let target_url = self.target_url(&request);
        let verify_ssl = self.tls_verify == TlsVerifyPolicy::Auto && should_verify(&target_url);
        let body = RequestBody::extract(&request.headers, request.body.clone());

        if request.method == Method::POST {
            let record = NewLogRecord::capture(
                request.path.clone(),
                body.to_payload(),
                &request.headers,
                request.client_addr.to_string(),
            );
            self.log.record(record).await;
        }

        tracing::info!(
            method = %request.method,
            target = %target_url,
            verify_ssl,
            "Proxying request"
        );

        let mut headers = strip_hop_by_hop(&request.headers);
        // Only re-serialized JSON changes length; raw bodies get the same value back.
        headers.remove(header::CONTENT_LENGTH);

        let client = if verify_ssl { &self.verifying } else { &self.insecure };
        let mut outbound = client
            .request(request.method.clone(), &target_url)
            .headers(headers);
        if let Some(bytes) = body.into_bytes() {
            outbound = outbound.body(bytes);
        }

        let response = outbound.send().await.map_err(ForwardError::from_reqwest)?;
        let status = response.status();
        let headers = strip_hop_by_hop(response.headers());
        let body = response.bytes().await.map_err(ForwardError::from_reqwest)?;

        tracing::debug!(
            target = %target_url,
            status = %status,
            bytes = body.len(),
            "Upstream responded"
        );

        Ok(UpstreamResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLogStore;
    use axum::http::HeaderValue;
    use std::sync::Arc;

    fn forwarder(upstream: UpstreamConfig) -> Forwarder {
        let log = RequestLog::new(Arc::new(MemoryLogStore::new()));
        Forwarder::new(&upstream, Duration::from_secs(1), log).unwrap()
    }

    fn request(path: &str, query: Option<&str>) -> InboundRequest {
        InboundRequest {
            method: Method::GET,
            path: path.to_string(),
            query: query.map(str::to_string),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            client_addr: "127.0.0.1:5000".parse().unwrap(),
        }
    }

    #[test]
    fn target_url_appends_path_and_query() {
        let engine = forwarder(UpstreamConfig {
            target_url: Some("https://api.example.com/".into()),
            ..Default::default()
        });

        assert_eq!(
            engine.target_url(&request("/foo", Some("bar=1&bar=2"))),
            "https://api.example.com/foo?bar=1&bar=2"
        );
        assert_eq!(engine.target_url(&request("/", Some(""))), "https://api.example.com/");
    }

    #[test]
    fn target_url_uses_referer_in_bidirectional_mode() {
        let engine = forwarder(UpstreamConfig {
            endpoint_a: Some("https://a.example.com".into()),
            endpoint_b: Some("http://b.example.com".into()),
            ..Default::default()
        });

        let mut req = request("/sync", None);
        req.headers.insert(
            header::REFERER,
            HeaderValue::from_static("http://b.example.com/page"),
        );
        assert_eq!(engine.target_url(&req), "https://a.example.com/sync");
        assert_eq!(engine.target_url(&request("/sync", None)), "http://b.example.com/sync");
    }

    #[test]
    fn missing_target_is_a_setup_error() {
        let log = RequestLog::new(Arc::new(MemoryLogStore::new()));
        let result = Forwarder::new(&UpstreamConfig::default(), Duration::from_secs(1), log);
        assert!(matches!(result, Err(SetupError::Target(_))));
    }

    #[tokio::test]
    async fn upstream_response_relays_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert("x-upstream", HeaderValue::from_static("yes"));
        let response = UpstreamResponse {
            status: StatusCode::FOUND,
            headers,
            body: Bytes::from_static(b"\x00\x01binary"),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()["x-upstream"], "yes");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"\x00\x01binary");
    }
}
