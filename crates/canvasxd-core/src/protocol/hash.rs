//! Hash-fragment protocol (`#access_token=...&instance_url=...`).
//!
//! The parent appends authorization context to the frame URL fragment; it is
//! read once at startup or after the OAuth popup redirects back.

/// Values recognised in the fragment. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashParams {
    pub access_token: Option<String>,
    pub instance_url: Option<String>,
    pub target_origin: Option<String>,
    pub instance_id: Option<String>,
}

impl HashParams {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
            && self.instance_url.is_none()
            && self.target_origin.is_none()
            && self.instance_id.is_none()
    }
}

/// `decodeURIComponent` that falls back to the raw input on malformed escapes.
pub fn decode_component(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(s) => s.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Strip a leading `#` and percent-decode the rest.
pub fn decode_hash(hash: &str) -> String {
    decode_component(hash.strip_prefix('#').unwrap_or(hash))
}

/// Parse `name=value` pairs joined by `&`.
///
/// `target_origin` is decoded twice: parents encode it once more so it can
/// carry its own query string.
pub fn parse_hash_fragment(hash: &str) -> HashParams {
    let mut out = HashParams::default();
    let hash = hash.strip_prefix('#').unwrap_or(hash);
    if hash.is_empty() {
        return out;
    }

    for pair in hash.split('&') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let value = decode_component(value);
        match name {
            "access_token" => out.access_token = Some(value),
            "instance_url" => out.instance_url = Some(value),
            "target_origin" => out.target_origin = Some(decode_component(&value)),
            "instance_id" => out.instance_id = Some(value),
            _ => {}
        }
    }
    out
}
