//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest (method, path, query, headers, body, client addr)
//!     → target.rs (pick base URL, decide TLS verification)
//!     → body.rs (JSON / raw / empty)
//!     → store (POST only, failures swallowed)
//!     → engine.rs (strip hop-by-hop, send with timeout, no redirects)
//!     → UpstreamResponse (status, filtered headers, body bytes)
//!       or ForwardError (504 / 502 / 500 JSON)
//! ```
//!
//! # Design Decisions
//! - Transport failures are a typed result, not control flow
//! - Response bodies are relayed byte-for-byte, never re-encoded

pub mod body;
pub mod engine;
pub mod error;
pub mod target;

pub use engine::{Forwarder, InboundRequest, UpstreamResponse};
pub use error::{ForwardError, SetupError};
pub use target::{should_verify, TargetResolver};
