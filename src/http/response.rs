//! Response helpers.
//!
//! # Responsibilities
//! - Uniform JSON error bodies for management endpoints
//!
//! # Design Decisions
//! - Every error body carries `success: false` and a message, never internals
//! - Proxy failures build their own bodies (see `forward::error`)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// `{"success": false, "error": message}` with the given status.
pub fn json_error(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": message.to_string(),
        })),
    )
        .into_response()
}
