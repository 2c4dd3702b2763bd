//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults / config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (overlay .env and process environment)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → passed by reference into every subsystem constructor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the upstream target never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, load_config, ConfigError};
pub use schema::ProxyConfig;
pub use schema::ListenerConfig;
pub use schema::UpstreamConfig;
pub use schema::{LogStoreBackend, LogStoreConfig, ObservabilityConfig, TlsVerifyPolicy};
