//! URL helpers used for origin pinning.

use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::expect_used)]
static ORIGIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^:]+://[^/?#]+).*").expect("origin regex"));

#[allow(clippy::expect_used)]
static JSON_OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{.*\}$").expect("json regex"));

/// Strip a URL down to `{scheme}://{host}:{port}`, dropping path, query and
/// fragment. Empty input yields `None`; strings that do not look like URLs
/// are returned unchanged.
pub fn strip_url(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    Some(ORIGIN_RE.replace(url, "$1").into_owned())
}

/// `true` when the value begins with `http` (covers `https`).
pub fn starts_with_http(value: &str) -> bool {
    value.starts_with("http")
}

/// Cheap shape check run before any JSON parsing of inbound payloads.
pub fn appears_json(value: &str) -> bool {
    JSON_OBJECT_RE.is_match(value)
}
