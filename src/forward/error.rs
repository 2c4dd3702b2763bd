//! Forwarding failures and their caller-visible responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::validation::ValidationError;

/// A failed upstream call.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// The upstream did not answer within the configured timeout.
    #[error("Request timeout")]
    Timeout,

    /// DNS, refused connection or TLS handshake failure.
    #[error("Connection failed to target server")]
    Unreachable,

    /// Anything else, carrying the failure message.
    #[error("{0}")]
    Unexpected(String),
}

impl ForwardError {
    /// Classify a client error.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Unreachable
        } else {
            Self::Unexpected(err.to_string())
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Unreachable => StatusCode::BAD_GATEWAY,
            Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Unreachable => "unreachable",
            Self::Unexpected(_) => "unexpected",
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.to_string(),
            "success": false,
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Errors constructing the forwarding engine.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("invalid upstream configuration: {0}")]
    Target(#[from] ValidationError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: ForwardError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn timeout_maps_to_504() {
        let (status, body) = render(ForwardError::Timeout).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body, json!({"error": "Request timeout", "success": false}));
    }

    #[tokio::test]
    async fn unreachable_maps_to_502() {
        let (status, body) = render(ForwardError::Unreachable).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body,
            json!({"error": "Connection failed to target server", "success": false})
        );
    }

    #[tokio::test]
    async fn unexpected_carries_message() {
        let (status, body) = render(ForwardError::Unexpected("builder error".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "builder error", "success": false}));
    }
}
