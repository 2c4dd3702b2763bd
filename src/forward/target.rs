//! Upstream target selection.
//!
//! # Responsibilities
//! - Hold the immutable upstream base URL(s)
//! - Pick the target for a request (bidirectional mode uses the `Referer`)
//! - Decide whether upstream TLS must be verified
//!
//! # Design Decisions
//! - Bidirectional selection is a plain substring match on `Referer`:
//!   A in referer → B, else B in referer → A, else B. Both matching picks B.
//! - Verification follows the URL scheme, so a plaintext endpoint can be
//!   paired with a TLS one.

use url::Url;

use crate::config::UpstreamConfig;
use crate::config::validation::ValidationError;

/// Where requests are forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetResolver {
    /// Every request goes to the same base URL.
    Single(String),
    /// Requests bounce between two endpoints depending on provenance.
    Bidirectional { a: String, b: String },
}

impl TargetResolver {
    /// Build the resolver from configuration, normalizing trailing slashes.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, ValidationError> {
        match (&config.endpoint_a, &config.endpoint_b, &config.target_url) {
            (Some(a), Some(b), _) => Ok(Self::Bidirectional {
                a: normalize(a),
                b: normalize(b),
            }),
            (Some(_), None, _) | (None, Some(_), _) => Err(ValidationError::IncompletePair),
            (None, None, Some(target)) => Ok(Self::Single(normalize(target))),
            (None, None, None) => Err(ValidationError::MissingTarget),
        }
    }

    /// Base URL for a request carrying the given `Referer`.
    pub fn resolve(&self, referer: Option<&str>) -> &str {
        match self {
            Self::Single(target) => target,
            Self::Bidirectional { a, b } => {
                let referer = referer.unwrap_or("");
                if referer.contains(a.as_str()) {
                    b
                } else if referer.contains(b.as_str()) {
                    a
                } else {
                    b
                }
            }
        }
    }

    /// Human-readable route description for status reporting.
    pub fn describe(&self, source: &str) -> String {
        match self {
            Self::Single(target) => format!("{}->{}", source, target),
            Self::Bidirectional { a, b } => format!("{}<->{}", a, b),
        }
    }
}

fn normalize(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Whether upstream TLS certificates must be verified for `url`.
pub fn should_verify(url: &str) -> bool {
    Url::parse(url)
        .map(|url| url.scheme() == "https")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TargetResolver {
        TargetResolver::Bidirectional {
            a: "https://a.example.com".into(),
            b: "http://10.0.0.5:8080".into(),
        }
    }

    #[test]
    fn verify_follows_scheme() {
        assert!(should_verify("https://x/y"));
        assert!(!should_verify("http://x/y"));
        assert!(!should_verify("not a url"));
    }

    #[test]
    fn single_target_ignores_referer() {
        let resolver = TargetResolver::Single("https://api.example.com".into());
        assert_eq!(resolver.resolve(None), "https://api.example.com");
        assert_eq!(
            resolver.resolve(Some("https://elsewhere.example.com/page")),
            "https://api.example.com"
        );
    }

    #[test]
    fn bidirectional_bounces_between_endpoints() {
        let resolver = pair();
        assert_eq!(
            resolver.resolve(Some("https://a.example.com/dashboard")),
            "http://10.0.0.5:8080"
        );
        assert_eq!(
            resolver.resolve(Some("http://10.0.0.5:8080/callback")),
            "https://a.example.com"
        );
    }

    #[test]
    fn bidirectional_defaults_to_b() {
        let resolver = pair();
        assert_eq!(resolver.resolve(None), "http://10.0.0.5:8080");
        assert_eq!(resolver.resolve(Some("https://unrelated.test/")), "http://10.0.0.5:8080");
        // Both substrings present: the A check wins, so B is chosen.
        assert_eq!(
            resolver.resolve(Some("https://a.example.com/?from=http://10.0.0.5:8080")),
            "http://10.0.0.5:8080"
        );
    }

    #[test]
    fn from_config_strips_trailing_slash() {
        let config = UpstreamConfig {
            target_url: Some("https://api.example.com/".into()),
            ..Default::default()
        };
        assert_eq!(
            TargetResolver::from_config(&config).unwrap(),
            TargetResolver::Single("https://api.example.com".into())
        );
        assert_eq!(
            TargetResolver::from_config(&UpstreamConfig::default()),
            Err(ValidationError::MissingTarget)
        );
    }

    #[test]
    fn describe_routes() {
        assert_eq!(
            TargetResolver::Single("https://api.example.com".into()).describe("0.0.0.0:5443"),
            "0.0.0.0:5443->https://api.example.com"
        );
        assert_eq!(
            pair().describe("ignored"),
            "https://a.example.com<->http://10.0.0.5:8080"
        );
    }
}
