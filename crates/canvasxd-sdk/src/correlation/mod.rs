//! Request/response correlation.
//!
//! Outbound calls that expect an answer park a callback in a fixed ring of
//! slots; the slot index travels as the envelope `seq` and comes back on the
//! parent's response.

mod registry;

pub use registry::{CorrelationRegistry, ResponseCallback, REGISTRY_SLOTS};
