//! Header manipulation.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers on both proxy legs
//! - Keep every other header untouched (casing, order, duplicates)
//!
//! # Design Decisions
//! - Case-insensitive comparison against the exclusion set
//! - Filtering never mutates its input; a new map is returned

use axum::http::HeaderMap;

/// Headers that only make sense for a single transport connection.
pub const HOP_BY_HOP: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

fn is_excluded(name: &str, exclude: &[&str]) -> bool {
    exclude.iter().any(|e| e.eq_ignore_ascii_case(name))
}

/// Filter an ordered header multimap given as name/value pairs.
pub fn filter<K, V>(headers: &[(K, V)], exclude: &[&str]) -> Vec<(K, V)>
where
    K: AsRef<str> + Clone,
    V: Clone,
{
    headers
        .iter()
        .filter(|(name, _)| !is_excluded(name.as_ref(), exclude))
        .cloned()
        .collect()
}

/// Filter an `http` header map.
pub fn filter_map(headers: &HeaderMap, exclude: &[&str]) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_excluded(name.as_str(), exclude) {
            filtered.append(name.clone(), value.clone());
        }
    }
    filtered
}

/// Remove the hop-by-hop set from `headers`.
pub fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    filter_map(headers, HOP_BY_HOP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn strips_every_case_variant() {
        let headers = vec![
            ("Host", "example.com"),
            ("Content-Type", "application/json"),
            ("CONNECTION", "keep-alive"),
            ("Keep-Alive", "timeout=5"),
            ("X-Trace", "a"),
            ("Proxy-Authorization", "Basic Zm9vOmJhcg=="),
            ("proxy-authenticate", "Basic"),
            ("TE", "trailers"),
            ("Trailers", "Expires"),
            ("Transfer-Encoding", "chunked"),
            ("Upgrade", "websocket"),
            ("X-Trace", "b"),
        ];

        let filtered = filter(&headers, HOP_BY_HOP);

        assert_eq!(
            filtered,
            vec![
                ("Content-Type", "application/json"),
                ("X-Trace", "a"),
                ("X-Trace", "b"),
            ]
        );
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let headers: Vec<(String, String)> = Vec::new();
        assert!(filter(&headers, HOP_BY_HOP).is_empty());
        assert!(strip_hop_by_hop(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn header_map_keeps_duplicates_and_input_untouched() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("proxy.local"));
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));

        let filtered = strip_hop_by_hop(&headers);

        assert_eq!(headers.len(), 4);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.get("host").is_none());
        assert!(filtered.get("transfer-encoding").is_none());
        let cookies: Vec<_> = filtered.get_all("set-cookie").iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
    }

    #[test]
    fn custom_exclusion_set() {
        let headers = vec![("Authorization", "secret"), ("Accept", "*/*")];
        assert_eq!(filter(&headers, &["authorization"]), vec![("Accept", "*/*")]);
    }
}
