//! Logging reverse proxy library.
//!
//! Forwards every request to a configured upstream (or one of two endpoints
//! picked by the `Referer` header), records POST requests to a bounded
//! request log, and serves a small management surface next to the proxy.

pub mod admin;
pub mod config;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;
pub mod store;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
