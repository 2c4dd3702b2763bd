//! Management endpoints.
//!
//! # Routes
//! ```text
//! GET  /health       → status JSON
//! GET  /log          → HTML log viewer (viewer.rs)
//! GET  /log/records  → newest records as JSON
//! POST /log/delete   → clear the request log
//! ```
//!
//! These read or mutate the request log independently of live traffic.
//! Any other method on these paths is proxied like every unmatched request.

pub mod handlers;
pub mod viewer;

use axum::{
    routing::{get, post},
    Router,
};

use crate::http::server::{proxy_handler, AppState};
use self::handlers::*;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(get_health).fallback(proxy_handler))
        .route("/log", get(get_log_page).fallback(proxy_handler))
        .route("/log/records", get(get_log_records).fallback(proxy_handler))
        .route("/log/delete", post(delete_logs).fallback(proxy_handler))
}
