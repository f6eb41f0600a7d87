//! Protocol modules.
//!
//! - `envelope`: outbound envelope, tagged `Message` union, client descriptor,
//!   and the correlated `Response` shape.
//! - `frame`: inbound frame decoding and subscription notices.
//! - `url`, `hash`, `event_name`: the string grammars the protocol leans on.
//!
//! Inbound parsing never panics: anything that is not a well-formed frame for
//! this module is reported as `CanvasError::Protocol` so the caller can drop it.

pub mod envelope;
pub mod event_name;
pub mod frame;
pub mod hash;
pub mod url;

/// Marker placed on every outbound envelope so receivers can tell protocol
/// traffic apart from other users of the same postMessage channel.
pub const TARGET_MODULE: &str = "Canvas";

/// `src` value of envelopes produced by the embedded client.
pub const CLIENT_SRC: &str = "client";

/// Client protocol version stamped on outbound envelopes by default.
pub const DEFAULT_CLIENT_VERSION: &str = "41.0";

/// The one event name whose subscriptions are keyed by `params.topic`.
pub const STREAMING_EVENT: &str = "sfdc.streamingapi";
