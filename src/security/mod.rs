//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (check request body size)
//!     → headers.rs (strip hop-by-hop headers before forwarding)
//!     → Pass to forwarding engine
//!
//! Upstream response:
//!     → headers.rs (strip hop-by-hop headers before relaying)
//! ```
//!
//! # Design Decisions
//! - Hop-by-hop headers never cross a proxy leg in either direction
//! - No trust in client-supplied connection management headers

pub mod headers;
pub mod limits;
