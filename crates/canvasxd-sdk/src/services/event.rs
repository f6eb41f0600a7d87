use std::sync::Arc;

use serde_json::Value;

use canvasxd_core::error::{CanvasError, Result};
use canvasxd_core::protocol::frame::EventFrame;

use crate::dispatch::{InboundHandler, SubscriptionTable};

/// Handles `type:"event"`: subscription notices pushed by the parent.
pub struct EventService {
    table: Arc<SubscriptionTable>,
}

impl EventService {
    pub fn new(table: Arc<SubscriptionTable>) -> Self {
        Self { table }
    }
}

impl InboundHandler for EventService {
    fn frame_type(&self) -> &'static str {
        "event"
    }

    fn handle(&self, frame: Value) -> Result<()> {
        let frame: EventFrame = serde_json::from_value(frame)
            .map_err(|e| CanvasError::Protocol(format!("event frame invalid: {e}")))?;
        self.table.dispatch(&frame.payload);
        Ok(())
    }
}
