//! Inbound frame decoding.
//!
//! The postMessage channel is shared with unrelated code on the same page, so
//! decoding is a filter as much as a parser:
//! 1. the raw text must look like a JSON object (`{...}`) before parsing;
//! 2. parse failures are reported, never panicked on;
//! 3. frames tagged for another module are rejected.

use serde::Deserialize;
use serde_json::Value;

use super::{url::appears_json, STREAMING_EVENT, TARGET_MODULE};
use crate::error::{CanvasError, Result};

/// Decode one raw inbound payload into a JSON object addressed to us.
pub fn decode_frame(raw: &str) -> Result<Value> {
    if !appears_json(raw) {
        return Err(CanvasError::Protocol("payload is not a json object".into()));
    }

    let data: Value = serde_json::from_str(raw)
        .map_err(|e| CanvasError::Protocol(format!("invalid json: {e}")))?;

    match data.get("targetModule") {
        None | Some(Value::Null) => Ok(data),
        Some(Value::String(m)) if m.is_empty() || m == TARGET_MODULE => Ok(data),
        Some(other) => Err(CanvasError::Protocol(format!("foreign targetModule: {other}"))),
    }
}

/// `type` discriminator of an inbound frame, if present.
pub fn frame_type(data: &Value) -> Option<&str> {
    data.get("type").and_then(Value::as_str)
}

/// Which subscription callback a notice is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMethod {
    OnData,
    OnComplete,
}

impl EventMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "onData" => Some(EventMethod::OnData),
            "onComplete" => Some(EventMethod::OnComplete),
            _ => None,
        }
    }
}

/// Inbound subscription notice: `{type:"event", payload:{name, params, method, payload}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventFrame {
    pub payload: EventNotice,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventNotice {
    pub name: String,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl EventNotice {
    pub fn method(&self) -> Option<EventMethod> {
        self.method.as_deref().and_then(EventMethod::parse)
    }

    /// `params.topic`, used for the streaming event.
    pub fn topic(&self) -> Option<&str> {
        self.params
            .as_ref()
            .and_then(|p| p.get("topic"))
            .and_then(Value::as_str)
    }

    pub fn is_streaming(&self) -> bool {
        self.name == STREAMING_EVENT
    }
}
