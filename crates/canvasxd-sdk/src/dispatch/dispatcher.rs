use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use canvasxd_core::error::Result;
use canvasxd_core::protocol::frame::frame_type;

/// Handler for one inbound `type`.
pub trait InboundHandler: Send + Sync {
    fn frame_type(&self) -> &'static str;
    fn handle(&self, frame: Value) -> Result<()>;
}

/// `type -> handler` registry for decoded inbound frames.
///
/// Frames with a missing or unknown `type` are dropped: a newer parent may
/// speak message types this client predates.
#[derive(Default)]
pub struct EventRouter {
    handlers: DashMap<&'static str, Arc<dyn InboundHandler>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    pub fn register(&self, handler: Arc<dyn InboundHandler>) {
        self.handlers.insert(handler.frame_type(), handler);
    }

    pub fn registered_types(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|e| *e.key()).collect()
    }

    /// Route one frame. `Ok(false)` means it was dropped as unknown.
    pub fn dispatch(&self, frame: Value) -> Result<bool> {
        let Some(ty) = frame_type(&frame) else {
            tracing::trace!("inbound frame without type dropped");
            return Ok(false);
        };

        let handler = match self.handlers.get(ty) {
            Some(h) => h.value().clone(),
            None => {
                tracing::debug!(frame_type = %ty, "unknown inbound type dropped");
                return Ok(false);
            }
        };
        handler.handle(frame)?;
        Ok(true)
    }
}
