//! Host collaborators.
//!
//! The SDK never touches a real browser. Everything it needs from the page is
//! behind `FrameHost`: the postMessage primitive, the document URL fragment,
//! the frame's window name, and the document scroll/client metrics. A
//! browser binding implements this trait; `MemoryHost` backs tests and the
//! loopback harness.

pub mod memory;

pub use memory::{MemoryHost, PostedMessage};

/// Window a message is posted to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TargetWindow {
    /// The embedding page.
    #[default]
    Parent,
    /// Another frame addressed by window name.
    Named(String),
}

/// Document scroll/client metrics used by frame sizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentMetrics {
    pub scroll_height: u32,
    pub client_height: u32,
    pub scroll_top: u32,
    pub scroll_width: u32,
    pub client_width: u32,
    pub scroll_left: u32,
}

pub trait FrameHost: Send + Sync {
    /// Hand a serialized message to the platform primitive. `target_origin`
    /// is already restricted to `scheme://host:port` (or `*`).
    fn post_message(&self, target: &TargetWindow, message: &str, target_origin: &str);

    /// Current `location.hash`, including the leading `#`.
    fn location_hash(&self) -> Option<String>;

    /// `window.name` of the frame.
    fn window_name(&self) -> Option<String>;

    fn document_metrics(&self) -> DocumentMetrics;
}
