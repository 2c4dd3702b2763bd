//! Echo upstream for trying the proxy locally.
//!
//! ```text
//! cargo run --example mock_backend            # listens on 127.0.0.1:8081
//! TARGET_HOST=http://127.0.0.1:8081 cargo run
//! ```

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::Redirect,
    routing::{any, get},
    Json, Router,
};
use serde_json::{json, Value};

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let headers: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or("").to_string()))
        .collect();

    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
}

#[tokio::main]
async fn main() {
    let app = Router::new()
        .route("/status", get(|| async { "Backend is healthy!" }))
        .route("/redirect", get(|| async { Redirect::temporary("/status") }))
        .route("/fail", any(|| async { (StatusCode::SERVICE_UNAVAILABLE, "backend failure") }))
        .fallback(echo);

    let addr = SocketAddr::from(([127, 0, 0, 1], 8081));
    println!("Echo backend listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
