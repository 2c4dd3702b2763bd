//! Inbound body classification.

use axum::body::Bytes;
use axum::http::{header, HeaderMap};

use crate::store::Payload;

/// Body of an inbound request, as the engine understands it.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Declared as JSON and parsed successfully.
    Json(serde_json::Value),
    /// Anything else, forwarded byte-for-byte.
    Raw(Bytes),
    Empty,
}

impl RequestBody {
    /// Classify `body` using the request's `Content-Type`.
    ///
    /// A JSON content type with an unparsable body falls back to `Raw`.
    pub fn extract(headers: &HeaderMap, body: Bytes) -> Self {
        if body.is_empty() {
            return Self::Empty;
        }

        if is_json(headers) {
            if let Ok(value) = serde_json::from_slice(&body) {
                return Self::Json(value);
            }
        }

        Self::Raw(body)
    }

    /// Log representation of the body.
    pub fn to_payload(&self) -> Option<Payload> {
        match self {
            Self::Json(value) => Some(Payload::Json(value.clone())),
            Self::Raw(bytes) => Some(Payload::Text(String::from_utf8_lossy(bytes).into_owned())),
            Self::Empty => None,
        }
    }

    /// Bytes to send upstream. JSON is re-serialized.
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Self::Json(value) => Some(Bytes::from(value.to_string())),
            Self::Raw(bytes) => Some(bytes),
            Self::Empty => None,
        }
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            essence == "application/json" || essence.ends_with("+json")
        })
        .unwrap_or(false)
}
