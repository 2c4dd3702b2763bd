//! Request size limits.
//!
//! # Responsibilities
//! - Cap inbound body size before it is buffered for forwarding
//!
//! # Design Decisions
//! - Oversized bodies are rejected with 413 before reaching the upstream
//! - Enforced by tower-http so chunked bodies are covered too

use tower_http::limit::RequestBodyLimitLayer;

use crate::config::schema::SecurityConfig;

/// Build the body limit layer for the configured maximum size.
pub fn body_limit_layer(config: &SecurityConfig) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(config.max_body_size)
}
