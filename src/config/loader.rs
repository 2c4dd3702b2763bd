//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{LogFormat, LogStoreBackend, ProxyConfig, TlsConfig, TlsVerifyPolicy};
use crate::config::validation::{validate_config, ValidationError};

const DEFAULT_CERT_PATH: &str = "./certs/server.crt";
const DEFAULT_KEY_PATH: &str = "./certs/server.key";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => write!(f, "Invalid value for {}: {:?}", var, value),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML file without validating it.
pub fn read_config_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let config = read_config_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the effective configuration: defaults or `path`, then the process
/// environment on top, then validation.
pub fn load(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let base = match path {
        Some(path) => read_config_file(path)?,
        None => ProxyConfig::default(),
    };

    let config = apply_env(base, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` returns the value of a variable, or `None` when it is unset.
pub fn apply_env<F>(mut config: ProxyConfig, lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(target) = get("TARGET_HOST") {
        config.upstream.target_url = Some(target);
    }
    if let Some(a) = get("PROXY_ENDPOINT_A") {
        config.upstream.endpoint_a = Some(a);
    }
    if let Some(b) = get("PROXY_ENDPOINT_B") {
        config.upstream.endpoint_b = Some(b);
    }
    if let Some(policy) = get("UPSTREAM_TLS_VERIFY") {
        config.upstream.tls_verify = match policy.to_ascii_lowercase().as_str() {
            "auto" => TlsVerifyPolicy::Auto,
            "disabled" | "false" | "off" => TlsVerifyPolicy::Disabled,
            _ => return Err(env_error("UPSTREAM_TLS_VERIFY", policy)),
        };
    }
    if let Some(timeout) = get("PROXY_TIMEOUT") {
        config.timeouts.request_secs = parse_number("PROXY_TIMEOUT", timeout)?;
    }

    let host = get("GATEWAY_HOST");
    let port = get("GATEWAY_PORT");
    if host.is_some() || port.is_some() {
        let (current_host, current_port) = split_host_port(&config.listener.bind_address);
        let port = match port {
            Some(port) => parse_number::<u16>("GATEWAY_PORT", port)?.to_string(),
            None => current_port,
        };
        let host = host.unwrap_or(current_host);
        config.listener.bind_address = format!("{}:{}", host, port);
    }

    if let Some(enabled) = get("SSL_ENABLED") {
        if parse_bool("SSL_ENABLED", enabled)? {
            let existing = config.listener.tls.take();
            config.listener.tls = Some(TlsConfig {
                cert_path: get("SSL_CERT_PATH")
                    .or_else(|| existing.as_ref().map(|t| t.cert_path.clone()))
                    .unwrap_or_else(|| DEFAULT_CERT_PATH.to_string()),
                key_path: get("SSL_KEY_PATH")
                    .or_else(|| existing.as_ref().map(|t| t.key_path.clone()))
                    .unwrap_or_else(|| DEFAULT_KEY_PATH.to_string()),
            });
        } else {
            config.listener.tls = None;
        }
    } else if let Some(tls) = config.listener.tls.as_mut() {
        if let Some(cert) = get("SSL_CERT_PATH") {
            tls.cert_path = cert;
        }
        if let Some(key) = get("SSL_KEY_PATH") {
            tls.key_path = key;
        }
    }

    if let Some(level) = get("LOG_LEVEL") {
        config.observability.log_level = level.to_ascii_lowercase();
    }
    if let Some(format) = get("LOG_FORMAT") {
        config.observability.log_format = match format.to_ascii_lowercase().as_str() {
            "pretty" | "text" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            _ => return Err(env_error("LOG_FORMAT", format)),
        };
    }
    if let Some(enabled) = get("METRICS_ENABLED") {
        config.observability.metrics_enabled = parse_bool("METRICS_ENABLED", enabled)?;
    }
    if let Some(addr) = get("METRICS_ADDRESS") {
        config.observability.metrics_address = addr;
    }

    if let Some(backend) = get("LOG_STORE_BACKEND") {
        config.log_store.backend = match backend.to_ascii_lowercase().as_str() {
            "sqlite" => LogStoreBackend::Sqlite,
            "memory" => LogStoreBackend::Memory,
            _ => return Err(env_error("LOG_STORE_BACKEND", backend)),
        };
    }
    if let Some(path) = get("LOG_DB_PATH") {
        config.log_store.path = path;
    }

    if let Some(size) = get("MAX_REQUEST_SIZE") {
        config.security.max_body_size = parse_number("MAX_REQUEST_SIZE", size)?;
    }

    Ok(config)
}

fn env_error(var: &'static str, value: String) -> ConfigError {
    ConfigError::Env { var, value }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| env_error(var, value))
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(env_error(var, value)),
    }
}

fn split_host_port(addr: &str) -> (String, String) {
    match addr.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.to_string()),
        None => (addr.to_string(), "5443".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_defaults() {
        let config = apply_env(
            ProxyConfig::default(),
            env(&[
                ("PROXY_ENDPOINT_A", "https://a.example.com"),
                ("PROXY_ENDPOINT_B", "http://b.internal:8080"),
                ("PROXY_TIMEOUT", "12"),
                ("GATEWAY_PORT", "5011"),
                ("LOG_STORE_BACKEND", "memory"),
                ("MAX_REQUEST_SIZE", "2048"),
            ]),
        )
        .unwrap();

        assert_eq!(config.upstream.endpoint_a.as_deref(), Some("https://a.example.com"));
        assert_eq!(config.upstream.endpoint_b.as_deref(), Some("http://b.internal:8080"));
        assert_eq!(config.timeouts.request_secs, 12);
        assert_eq!(config.listener.bind_address, "0.0.0.0:5011");
        assert_eq!(config.log_store.backend, LogStoreBackend::Memory);
        assert_eq!(config.security.max_body_size, 2048);
    }

    #[test]
    fn ssl_enabled_uses_default_cert_paths() {
        let config = apply_env(ProxyConfig::default(), env(&[("SSL_ENABLED", "True")])).unwrap();
        let tls = config.listener.tls.unwrap();
        assert_eq!(tls.cert_path, DEFAULT_CERT_PATH);
        assert_eq!(tls.key_path, DEFAULT_KEY_PATH);

        let config = apply_env(
            ProxyConfig::default(),
            env(&[("SSL_ENABLED", "true"), ("SSL_CERT_PATH", "/etc/proxy/cert.pem")]),
        )
        .unwrap();
        assert_eq!(config.listener.tls.unwrap().cert_path, "/etc/proxy/cert.pem");
    }

    #[test]
    fn rejects_malformed_values() {
        let err = apply_env(ProxyConfig::default(), env(&[("PROXY_TIMEOUT", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "PROXY_TIMEOUT", .. }));

        let err = apply_env(ProxyConfig::default(), env(&[("SSL_ENABLED", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "SSL_ENABLED", .. }));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = apply_env(ProxyConfig::default(), env(&[("TARGET_HOST", "  ")])).unwrap();
        assert!(config.upstream.target_url.is_none());
    }

    #[test]
    fn load_config_reads_and_validates_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy.toml");
        fs::write(
            &path,
            "[upstream]\ntarget_url = \"http://127.0.0.1:9000\"\n\n[timeouts]\nrequest_secs = 5\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.timeouts.request_secs, 5);

        fs::write(&path, "[timeouts]\nrequest_secs = 5\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }
}
