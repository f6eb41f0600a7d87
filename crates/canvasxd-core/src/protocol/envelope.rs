//! Outbound envelope and message types.
//!
//! Every call from the frame to its parent is one `Envelope` whose `body` is a
//! `Message`. The message is a tagged union over `type`, each variant carrying
//! a `config.client` descriptor that names the authorization context and the
//! routing target.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::CLIENT_SRC;

/// Outer wrapper: correlation id plus version metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Correlation id (slot in the pending-call ring).
    pub seq: u32,
    /// Always `"client"` for frames sent by the SDK.
    pub src: String,
    pub client_version: String,
    /// Last parent version seen on an inbound response, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_version: Option<String>,
    pub body: Message,
}

impl Envelope {
    pub fn new(seq: u32, client_version: &str, parent_version: Option<String>, body: Message) -> Self {
        Self {
            seq,
            src: CLIENT_SRC.to_string(),
            client_version: client_version.to_string(),
            parent_version,
            body,
        }
    }
}

/// Authorization/routing triple required for relayed calls.
///
/// Empty strings count as missing, matching how the parent treats them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDescriptor {
    #[serde(default)]
    pub oauth_token: Option<String>,
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub target_origin: Option<String>,
    /// Visualforce host: subscriptions are wired locally, no round trip.
    #[serde(default, rename = "isVF", skip_serializing_if = "is_false")]
    pub is_vf: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_nil(v: &Option<String>) -> bool {
    v.as_deref().map_or(true, str::is_empty)
}

impl ClientDescriptor {
    pub fn new(
        oauth_token: impl Into<String>,
        instance_id: impl Into<String>,
        target_origin: impl Into<String>,
    ) -> Self {
        Self {
            oauth_token: Some(oauth_token.into()),
            instance_id: Some(instance_id.into()),
            target_origin: Some(target_origin.into()),
            is_vf: false,
        }
    }

    /// Descriptor used by refresh/repost: no token, wildcard origin.
    pub fn anonymous(instance_id: impl Into<String>) -> Self {
        Self::new("null", instance_id, "*")
    }

    pub fn with_vf(mut self, is_vf: bool) -> Self {
        self.is_vf = is_vf;
        self
    }

    /// Check the triple. A missing instance id or target origin wins over a
    /// missing token.
    pub fn validate(&self, parent_version: Option<&str>) -> std::result::Result<(), Response> {
        if is_nil(&self.instance_id) || is_nil(&self.target_origin) {
            return Err(Response::synthetic(
                400,
                "Bad Request",
                parent_version,
                "client.instanceId or client.targetOrigin not supplied",
            ));
        }
        if is_nil(&self.oauth_token) {
            return Err(Response::synthetic(
                401,
                "Unauthorized",
                parent_version,
                "client or client.oauthToken not supplied",
            ));
        }
        Ok(())
    }

    pub fn token(&self) -> &str {
        self.oauth_token.as_deref().unwrap_or_default()
    }
}

/// `{client}` wrapper carried by every message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageConfig {
    pub client: ClientDescriptor,
}

impl From<ClientDescriptor> for MessageConfig {
    fn from(client: ClientDescriptor) -> Self {
        Self { client }
    }
}

/// Settings relayed with an `ajax` call. Callbacks never appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AjaxConfig {
    pub client: ClientDescriptor,
    pub method: String,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub content_type: String,
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_origin: Option<String>,
    /// Caller-supplied settings the SDK does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-name entry in a (un)subscribe message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Event published by the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedEvent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PublishedEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
            extra: Map::new(),
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Requested frame size as CSS lengths; `""` leaves a dimension unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub height: String,
    pub width: String,
}

impl FrameSize {
    pub fn is_empty(&self) -> bool {
        self.height.is_empty() && self.width.is_empty()
    }
}

/// Message body, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Ajax {
        url: String,
        config: AjaxConfig,
    },
    Ctx {
        #[serde(rename = "accessToken")]
        access_token: String,
        config: MessageConfig,
    },
    Subscribe {
        config: MessageConfig,
        subscriptions: BTreeMap<String, SubscriptionParams>,
    },
    Unsubscribe {
        config: MessageConfig,
        subscriptions: BTreeMap<String, SubscriptionParams>,
    },
    Publish {
        config: MessageConfig,
        event: PublishedEvent,
    },
    Resize {
        config: MessageConfig,
        size: FrameSize,
    },
    Refresh {
        #[serde(rename = "accessToken")]
        access_token: String,
        config: MessageConfig,
    },
    Repost {
        #[serde(rename = "accessToken")]
        access_token: String,
        config: MessageConfig,
        refresh: bool,
    },
}

impl Message {
    /// Wire name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Ajax { .. } => "ajax",
            Message::Ctx { .. } => "ctx",
            Message::Subscribe { .. } => "subscribe",
            Message::Unsubscribe { .. } => "unsubscribe",
            Message::Publish { .. } => "publish",
            Message::Resize { .. } => "resize",
            Message::Refresh { .. } => "refresh",
            Message::Repost { .. } => "repost",
        }
    }

    /// Descriptor the message is routed with.
    pub fn client(&self) -> &ClientDescriptor {
        match self {
            Message::Ajax { config, .. } => &config.client,
            Message::Ctx { config, .. }
            | Message::Subscribe { config, .. }
            | Message::Unsubscribe { config, .. }
            | Message::Publish { config, .. }
            | Message::Resize { config, .. }
            | Message::Refresh { config, .. }
            | Message::Repost { config, .. } => &config.client,
        }
    }
}

/// Correlated response delivered to ajax/ctx/refresh callbacks. Validation
/// failures are reported in the same shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default)]
    pub seq: Option<u32>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub parent_version: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl Response {
    pub fn synthetic(status: u16, status_text: &str, parent_version: Option<&str>, payload: &str) -> Self {
        Self {
            seq: None,
            status: Some(status),
            status_text: Some(status_text.to_string()),
            parent_version: parent_version.map(str::to_string),
            payload: Value::String(payload.to_string()),
        }
    }

    /// `401` whose first payload entry carries `INVALID_SESSION_ID`.
    pub fn is_invalid_session(&self) -> bool {
        self.status == Some(401)
            && self
                .payload
                .as_array()
                .and_then(|a| a.first())
                .and_then(|e| e.get("errorCode"))
                .and_then(Value::as_str)
                == Some("INVALID_SESSION_ID")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_wire_shape() {
        let env = Envelope::new(
            7,
            "41.0",
            None,
            Message::Ctx {
                access_token: "tok".into(),
                config: ClientDescriptor::new("tok", "inst", "https://parent.com").into(),
            },
        );
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(
            v,
            json!({
                "seq": 7,
                "src": "client",
                "clientVersion": "41.0",
                "body": {
                    "type": "ctx",
                    "accessToken": "tok",
                    "config": {"client": {
                        "oauthToken": "tok",
                        "instanceId": "inst",
                        "targetOrigin": "https://parent.com"
                    }}
                }
            })
        );
    }

    #[test]
    fn validation_precedence() {
        let missing_all = ClientDescriptor::default();
        assert_eq!(missing_all.validate(None).unwrap_err().status, Some(400));

        let missing_token = ClientDescriptor {
            oauth_token: Some(String::new()),
            ..ClientDescriptor::new("", "inst", "https://p.com")
        };
        let r = missing_token.validate(Some("41.0")).unwrap_err();
        assert_eq!(r.status, Some(401));
        assert_eq!(r.status_text.as_deref(), Some("Unauthorized"));
        assert_eq!(r.parent_version.as_deref(), Some("41.0"));

        assert!(ClientDescriptor::new("t", "i", "*").validate(None).is_ok());
    }

    #[test]
    fn invalid_session_detection() {
        let r = Response {
            status: Some(401),
            payload: json!([{"errorCode": "INVALID_SESSION_ID", "message": "expired"}]),
            ..Default::default()
        };
        assert!(r.is_invalid_session());

        let other = Response {
            status: Some(401),
            payload: json!("nope"),
            ..Default::default()
        };
        assert!(!other.is_invalid_session());
    }
}
