//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, route dispatch)
//!     → request.rs (request ID, buffer into InboundRequest)
//!     → admin routes, or the forwarding engine for everything else
//!     → response.rs / forward (status + headers + body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
