//! Event-name grammar and reserved namespaces.
//!
//! A name is `local` or `namespace.local`; both segments must match
//! `^[A-Za-z_$][A-Za-z0-9_$]*$`. Namespaces in the reserved set are rejected
//! unless the caller exempts them for that one call.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Namespaces reserved for platform use.
pub const DEFAULT_RESERVED_NAMESPACES: [&str; 6] =
    ["sfdc", "canvas", "force", "salesforce", "chatter", "s1"];

#[allow(clippy::expect_used)]
static SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[$A-Za-z_][0-9A-Za-z_$]*$").expect("segment regex"));

static DEFAULT_POLICY: Lazy<EventNamePolicy> = Lazy::new(EventNamePolicy::default);

/// Why a name was rejected. `code()` keeps the numeric codes stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EventNameError {
    #[error("Event names can only contain one namespace")]
    TooManyNamespaces,
    #[error("Namespace has already been reserved")]
    ReservedNamespace,
    #[error("Event name contains invalid characters")]
    InvalidCharacters,
}

impl EventNameError {
    pub fn code(self) -> u8 {
        match self {
            EventNameError::TooManyNamespaces => 1,
            EventNameError::ReservedNamespace => 2,
            EventNameError::InvalidCharacters => 3,
        }
    }
}

/// Immutable reserved-namespace set. Exemptions are passed per call and never
/// mutate the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventNamePolicy {
    reserved: BTreeSet<String>,
}

impl Default for EventNamePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_NAMESPACES)
    }
}

impl EventNamePolicy {
    pub fn new<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            reserved: reserved
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn is_reserved(&self, namespace: &str) -> bool {
        self.reserved.contains(&namespace.to_lowercase())
    }

    pub fn validate(&self, name: &str, exempt: &[&str]) -> Result<(), EventNameError> {
        let parts: Vec<&str> = name.split('.').collect();
        let (ns, local) = match parts.as_slice() {
            [local] => (None, *local),
            [ns, local] => (Some(*ns), *local),
            _ => return Err(EventNameError::TooManyNamespaces),
        };

        if let Some(ns) = ns {
            let ns = ns.to_lowercase();
            if self.reserved.contains(&ns) && !exempt.contains(&ns.as_str()) {
                return Err(EventNameError::ReservedNamespace);
            }
        }

        let first = ns.unwrap_or(local);
        if !SEGMENT_RE.is_match(first) || !SEGMENT_RE.is_match(local) {
            return Err(EventNameError::InvalidCharacters);
        }
        Ok(())
    }
}

/// Numeric form against the default reserved set: `0` when valid.
pub fn valid_event_name(name: &str, exempt: &[&str]) -> u8 {
    match DEFAULT_POLICY.validate(name, exempt) {
        Ok(()) => 0,
        Err(e) => e.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exemption_applies_per_call() {
        assert_eq!(valid_event_name("canvas.scroll", &["canvas"]), 0);
        assert_eq!(valid_event_name("canvas.scroll", &[]), 2);
        assert_eq!(valid_event_name("sfdc.custom", &[]), 2);
        assert_eq!(valid_event_name("SFDC.custom", &["sfdc"]), 0);
        assert_eq!(valid_event_name("s1.navigate", &["canvas", "sfdc"]), 2);
        assert_eq!(valid_event_name("s1.navigate", &["s1"]), 0);
    }

    #[test]
    fn grammar() {
        assert_eq!(valid_event_name("mynamespace.someevent", &[]), 0);
        assert_eq!(valid_event_name("plain", &[]), 0);
        assert_eq!(valid_event_name("$ns._local9", &[]), 0);
        assert_eq!(valid_event_name("a.b.c", &[]), 1);
        assert_eq!(valid_event_name("9ns.event", &[]), 3);
        assert_eq!(valid_event_name("ns.bad-name", &[]), 3);
        assert_eq!(valid_event_name("ns.", &[]), 3);
        assert_eq!(valid_event_name("", &[]), 3);
    }

    #[test]
    fn custom_reserved_set() {
        let policy = EventNamePolicy::new(["Acme"]);
        assert_eq!(
            policy.validate("acme.ping", &[]),
            Err(EventNameError::ReservedNamespace)
        );
        assert!(policy.validate("sfdc.ping", &[]).is_ok());
        assert!(policy.is_reserved("ACME"));
    }
}
