use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use canvasxd_core::error::{CanvasError, Result};
use canvasxd_core::protocol::envelope::Response;

use crate::correlation::CorrelationRegistry;
use crate::dispatch::InboundHandler;

/// Last `parentVersion` the parent reported. Stamped on later envelopes.
#[derive(Debug, Default)]
pub struct ParentVersion(RwLock<Option<String>>);

impl ParentVersion {
    pub fn get(&self) -> Option<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set(&self, version: impl Into<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(version.into());
    }
}

/// Handles `type:"callback"`: correlated answers to ajax/ctx/refresh.
pub struct CallbackService {
    registry: Arc<CorrelationRegistry>,
    parent_version: Arc<ParentVersion>,
}

impl CallbackService {
    pub fn new(registry: Arc<CorrelationRegistry>, parent_version: Arc<ParentVersion>) -> Self {
        Self {
            registry,
            parent_version,
        }
    }
}

impl InboundHandler for CallbackService {
    fn frame_type(&self) -> &'static str {
        "callback"
    }

    fn handle(&self, frame: Value) -> Result<()> {
        let response: Response = serde_json::from_value(frame)
            .map_err(|e| CanvasError::Protocol(format!("callback frame invalid: {e}")))?;

        if let Some(v) = response.parent_version.as_deref().filter(|v| !v.is_empty()) {
            self.parent_version.set(v);
        }

        let seq = response
            .seq
            .ok_or_else(|| CanvasError::Protocol("callback frame requires seq".into()))?;
        self.registry.resolve(seq, response);
        Ok(())
    }
}
