//! Inbound routing.
//!
//! Re-exports the router, the handler trait, and the subscription table so
//! the client and services can depend on this module directly.

pub mod dispatcher;
pub mod subscriptions;

pub use dispatcher::{EventRouter, InboundHandler};
pub use subscriptions::{EventHandler, Subscription, SubscriptionTable, Unsubscription};
