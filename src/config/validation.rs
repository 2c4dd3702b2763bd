//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that an upstream target is configured and well-formed
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check TLS material exists when the listener terminates TLS
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::path::Path;

use url::Url;

use crate::config::schema::{LogStoreBackend, ProxyConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("either upstream.target_url or both upstream.endpoint_a and upstream.endpoint_b must be configured")]
    MissingTarget,

    #[error("upstream.endpoint_a and upstream.endpoint_b must be configured together")]
    IncompletePair,

    #[error("{field} is not a valid http(s) URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("log_store.path must not be empty for the sqlite backend")]
    EmptyStorePath,

    #[error("TLS {kind} not found: {path}")]
    MissingTlsFile { kind: &'static str, path: String },
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let upstream = &config.upstream;

    match (&upstream.endpoint_a, &upstream.endpoint_b) {
        (Some(a), Some(b)) => {
            check_url("upstream.endpoint_a", a, &mut errors);
            check_url("upstream.endpoint_b", b, &mut errors);
        }
        (Some(_), None) | (None, Some(_)) => errors.push(ValidationError::IncompletePair),
        (None, None) => match &upstream.target_url {
            Some(target) => check_url("upstream.target_url", target, &mut errors),
            None => errors.push(ValidationError::MissingTarget),
        },
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if let Some(tls) = &config.listener.tls {
        if !Path::new(&tls.cert_path).exists() {
            errors.push(ValidationError::MissingTlsFile {
                kind: "certificate",
                path: tls.cert_path.clone(),
            });
        }
        if !Path::new(&tls.key_path).exists() {
            errors.push(ValidationError::MissingTlsFile {
                kind: "key",
                path: tls.key_path.clone(),
            });
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.log_store.backend == LogStoreBackend::Sqlite && config.log_store.path.trim().is_empty() {
        errors.push(ValidationError::EmptyStorePath);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    let valid = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false);

    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
