//! Request log record types.

use axum::http::HeaderMap;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Body captured from a logged request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Body was declared as JSON and parsed.
    Json(serde_json::Value),
    /// Any other body, decoded as (lossy) UTF-8.
    Text(String),
}

impl Payload {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Payload::Json(_) => "json",
            Payload::Text(_) => "text",
        }
    }

    /// Storage representation: JSON text for structured payloads, the literal otherwise.
    pub(crate) fn to_stored(&self) -> String {
        match self {
            Payload::Json(value) => value.to_string(),
            Payload::Text(text) => text.clone(),
        }
    }

    pub(crate) fn from_stored(kind: &str, stored: String) -> Result<Self, String> {
        match kind {
            "json" => serde_json::from_str(&stored)
                .map(Payload::Json)
                .map_err(|e| e.to_string()),
            "text" => Ok(Payload::Text(stored)),
            other => Err(format!("unknown payload kind {:?}", other)),
        }
    }
}

/// A record as handed to the store, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLogRecord {
    pub timestamp: String,
    pub endpoint: String,
    pub payload: Option<Payload>,
    pub headers: String,
    pub remote_addr: String,
    pub user_agent: Option<String>,
}

impl NewLogRecord {
    /// Capture a record for `endpoint`, stamped with the current time.
    pub fn capture(
        endpoint: impl Into<String>,
        payload: Option<Payload>,
        headers: &HeaderMap,
        remote_addr: impl Into<String>,
    ) -> Self {
        let user_agent = headers
            .get(axum::http::header::USER_AGENT)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        Self {
            timestamp: now_timestamp(),
            endpoint: endpoint.into(),
            payload,
            headers: serialize_headers(headers),
            remote_addr: remote_addr.into(),
            user_agent,
        }
    }

    pub(crate) fn with_id(self, id: i64) -> LogRecord {
        LogRecord {
            id,
            timestamp: self.timestamp,
            endpoint: self.endpoint,
            payload: self.payload,
            headers: self.headers,
            remote_addr: self.remote_addr,
            user_agent: self.user_agent,
        }
    }
}

/// A stored request log entry. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: i64,
    pub timestamp: String,
    pub endpoint: String,
    pub payload: Option<Payload>,
    pub headers: String,
    pub remote_addr: String,
    pub user_agent: Option<String>,
}

/// ISO-8601 timestamp in UTC with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize a header multimap as a JSON array of `[name, value]` pairs.
pub fn serialize_headers(headers: &HeaderMap) -> String {
    let pairs: Vec<(&str, String)> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    serde_json::to_string(&pairs).unwrap_or_else(|_| "[]".to_string())
}

/// Inverse of [`serialize_headers`]. Returns `None` for text that is not a pair list.
pub fn parse_headers(text: &str) -> Option<Vec<(String, String)>> {
    serde_json::from_str(text).ok()
}
