//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Extract the forwarding-relevant parts of an axum request
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body size is bounded by the limit layer; overflowing a streamed body
//!   while buffering is still a 413

use std::error::Error as StdError;
use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::forward::InboundRequest;
use crate::http::response::json_error;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a fresh UUID v4 for every request lacking an id.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request id set by the request-id layer, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Failure to buffer the caller's request. Never reaches the upstream.
#[derive(Debug, thiserror::Error)]
pub enum InboundError {
    #[error("Request body too large")]
    TooLarge,

    #[error("Failed to read request body: {0}")]
    Read(String),
}

impl InboundError {
    fn from_body_error(err: axum::Error) -> Self {
        let inner = err.into_inner();
        let mut source: Option<&(dyn StdError + 'static)> = Some(&*inner);
        while let Some(e) = source {
            if e.is::<LengthLimitError>() {
                return Self::TooLarge;
            }
            source = e.source();
        }
        Self::Read(inner.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Read(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for InboundError {
    fn into_response(self) -> Response {
        json_error(self.status(), &self)
    }
}

/// Buffer an axum request into an [`InboundRequest`].
pub async fn into_inbound(request: Request<Body>, client_addr: SocketAddr) -> Result<InboundRequest, InboundError> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(InboundError::from_body_error)?;

    Ok(InboundRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
        client_addr,
    })
}
