//! canvasxd core: transport-agnostic wire primitives, error types, and helpers.
//!
//! This crate defines the envelope contract spoken between an embedded canvas
//! frame and its parent page, plus the small string grammars the protocol
//! relies on (origin stripping, hash fragments, event names). It carries no
//! host or runtime dependencies so it can be reused by the SDK and by tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Inbound traffic on a
//! shared postMessage channel is untrusted, so every fallible path surfaces as
//! `CanvasError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{CanvasError, Result};
