//! In-process host used by tests and the loopback harness.

use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use super::{DocumentMetrics, FrameHost, TargetWindow};

/// One `post_message` call as the platform would have seen it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub target: TargetWindow,
    pub message: String,
    pub target_origin: String,
}

impl PostedMessage {
    /// Parsed message text; `None` if it is not JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.message).ok()
    }
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    posted: Mutex<Vec<PostedMessage>>,
    hash: Mutex<Option<String>>,
    name: Mutex<Option<String>>,
    metrics: Mutex<DocumentMetrics>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hash(self, hash: impl Into<String>) -> Self {
        self.set_hash(Some(hash.into()));
        self
    }

    pub fn with_window_name(self, name: impl Into<String>) -> Self {
        *self.name.lock().unwrap_or_else(PoisonError::into_inner) = Some(name.into());
        self
    }

    pub fn set_hash(&self, hash: Option<String>) {
        *self.hash.lock().unwrap_or_else(PoisonError::into_inner) = hash;
    }

    pub fn set_metrics(&self, metrics: DocumentMetrics) {
        *self.metrics.lock().unwrap_or_else(PoisonError::into_inner) = metrics;
    }

    pub fn posted(&self) -> Vec<PostedMessage> {
        self.posted.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn take_posted(&self) -> Vec<PostedMessage> {
        std::mem::take(&mut *self.posted.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn last_posted(&self) -> Option<PostedMessage> {
        self.posted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl FrameHost for MemoryHost {
    fn post_message(&self, target: &TargetWindow, message: &str, target_origin: &str) {
        self.posted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PostedMessage {
                target: target.clone(),
                message: message.to_string(),
                target_origin: target_origin.to_string(),
            });
    }

    fn location_hash(&self) -> Option<String> {
        self.hash.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn window_name(&self) -> Option<String> {
        self.name.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn document_metrics(&self) -> DocumentMetrics {
        *self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
