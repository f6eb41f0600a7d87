//! canvasxd runtime library.
//!
//! Wires the host bindings, transport, origin resolver, correlation registry,
//! event router and session into a `Client` facade. Consumed by the loopback
//! binary (`main.rs`) and by integration tests.

pub mod client;
pub mod config;
pub mod correlation;
pub mod dispatch;
pub mod host;
pub mod origin;
pub mod services;
pub mod session;
pub mod transport;

pub use client::{AjaxSettings, Client};
