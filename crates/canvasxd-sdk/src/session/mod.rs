//! OAuth session state for the embedded frame.
//!
//! Holds the authorization context (token, instance URL, instance id, parent
//! origin). Token and instance URL round-trip through a `KeyValueStore` so
//! they survive the host-driven reload after an OAuth popup completes.

mod oauth;
mod store;

pub use oauth::{Session, AUTHORIZE_PATH};
pub use store::{KeyValueStore, MemoryStore, ACCESS_TOKEN_KEY, INSTANCE_URL_KEY};
