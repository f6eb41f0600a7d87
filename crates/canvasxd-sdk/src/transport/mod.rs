//! Transport layer (cross-document messaging).
//!
//! Wraps the host's postMessage primitive: origin-restricted sends, and a
//! single replaceable inbound listener that filters by origin and module tag
//! before anything reaches the router.

pub mod xd;

pub use xd::{FrameCallback, SourceFilter, Transport};
