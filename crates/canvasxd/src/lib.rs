//! Top-level facade crate for canvasxd.
//!
//! Re-exports the wire primitives and the client SDK so embedders can depend on a single crate.

pub mod core {
    pub use canvasxd_core::*;
}

pub mod sdk {
    pub use canvasxd_sdk::*;
}
