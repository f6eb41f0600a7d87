use std::time::Duration;

use serde::Deserialize;

use canvasxd_core::error::{CanvasError, Result};
use canvasxd_core::protocol::event_name::{EventNamePolicy, DEFAULT_RESERVED_NAMESPACES};
use canvasxd_core::protocol::DEFAULT_CLIENT_VERSION;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub client: ClientSection,

    #[serde(default)]
    pub events: EventsSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            client: ClientSection::default(),
            events: EventsSection::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CanvasError::UnsupportedVersion);
        }
        self.client.validate()?;
        self.events.validate()?;
        Ok(())
    }

    pub fn event_names(&self) -> EventNamePolicy {
        EventNamePolicy::new(&self.events.reserved_namespaces)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    /// Stamped on every outbound envelope as `clientVersion`.
    #[serde(default = "default_client_version")]
    pub client_version: String,

    #[serde(default = "default_autogrow_interval_ms")]
    pub autogrow_interval_ms: u64,

    /// Window-name prefix the parent gives canvas frames; the remainder is the
    /// instance id used by refresh/repost.
    #[serde(default = "default_frame_name_prefix")]
    pub frame_name_prefix: String,

    /// Trust the first inbound origin, then drop frames from any other origin.
    /// When false every inbound origin is adopted as the parent origin.
    #[serde(default = "default_pin_inbound_origin")]
    pub pin_inbound_origin: bool,

    #[serde(default = "default_login_url")]
    pub login_url: String,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            client_version: default_client_version(),
            autogrow_interval_ms: default_autogrow_interval_ms(),
            frame_name_prefix: default_frame_name_prefix(),
            pin_inbound_origin: default_pin_inbound_origin(),
            login_url: default_login_url(),
        }
    }
}

impl ClientSection {
    pub fn validate(&self) -> Result<()> {
        if self.client_version.trim().is_empty() {
            return Err(CanvasError::Config("client.client_version must not be empty".into()));
        }
        if !(10..=60000).contains(&self.autogrow_interval_ms) {
            return Err(CanvasError::Config(
                "client.autogrow_interval_ms must be between 10 and 60000".into(),
            ));
        }
        if !self.login_url.starts_with("http") {
            return Err(CanvasError::Config("client.login_url must be an http(s) url".into()));
        }
        Ok(())
    }

    pub fn autogrow_interval(&self) -> Duration {
        Duration::from_millis(self.autogrow_interval_ms)
    }
}

fn default_client_version() -> String {
    DEFAULT_CLIENT_VERSION.into()
}
fn default_autogrow_interval_ms() -> u64 {
    300
}
fn default_frame_name_prefix() -> String {
    "canvas-frame-".into()
}
fn default_pin_inbound_origin() -> bool {
    true
}
fn default_login_url() -> String {
    "https://login.salesforce.com".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsSection {
    #[serde(default = "default_reserved_namespaces")]
    pub reserved_namespaces: Vec<String>,
}

impl Default for EventsSection {
    fn default() -> Self {
        Self {
            reserved_namespaces: default_reserved_namespaces(),
        }
    }
}

impl EventsSection {
    pub fn validate(&self) -> Result<()> {
        for ns in &self.reserved_namespaces {
            if ns.is_empty() || ns.contains('.') {
                return Err(CanvasError::Config(format!(
                    "events.reserved_namespaces entry is not a namespace: {ns:?}"
                )));
            }
        }
        Ok(())
    }
}

fn default_reserved_namespaces() -> Vec<String> {
    DEFAULT_RESERVED_NAMESPACES.iter().map(|s| s.to_string()).collect()
}
