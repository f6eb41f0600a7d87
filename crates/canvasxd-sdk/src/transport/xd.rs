use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;

use canvasxd_core::error::{CanvasError, Result};
use canvasxd_core::protocol::frame::decode_frame;
use canvasxd_core::protocol::url::strip_url;
use canvasxd_core::protocol::TARGET_MODULE;

use crate::host::{FrameHost, TargetWindow};

/// Receives decoded frames addressed to this module.
pub type FrameCallback = Arc<dyn Fn(Value) + Send + Sync>;

/// Which inbound events are accepted before decoding.
#[derive(Clone)]
pub enum SourceFilter {
    /// Accept every origin.
    Any,
    /// Exact match against the event origin.
    Origin(String),
    /// Called with `(origin, raw_data)`; `false` drops the event.
    Predicate(Arc<dyn Fn(&str, &str) -> bool + Send + Sync>),
}

impl SourceFilter {
    fn allows(&self, origin: &str, data: &str) -> bool {
        match self {
            SourceFilter::Any => true,
            SourceFilter::Origin(o) => o == origin,
            SourceFilter::Predicate(f) => f(origin, data),
        }
    }
}

impl std::fmt::Debug for SourceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFilter::Any => f.write_str("Any"),
            SourceFilter::Origin(o) => f.debug_tuple("Origin").field(o).finish(),
            SourceFilter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

struct Listener {
    callback: FrameCallback,
    filter: SourceFilter,
}

pub struct Transport {
    host: Arc<dyn FrameHost>,
    listener: Mutex<Option<Arc<Listener>>>,
}

impl Transport {
    pub fn new(host: Arc<dyn FrameHost>) -> Self {
        Self {
            host,
            listener: Mutex::new(None),
        }
    }

    /// Post `message` restricted to the origin of `target_url`.
    ///
    /// A missing target is a hard error: falling back to `*` would hand the
    /// frame's token to whatever page happens to embed it.
    pub fn send<T: Serialize>(
        &self,
        message: &T,
        target_url: Option<&str>,
        target: &TargetWindow,
    ) -> Result<()> {
        let origin = target_url.and_then(strip_url).ok_or_else(|| {
            CanvasError::Precondition("target_url was not supplied on postMessage".into())
        })?;

        let mut value = serde_json::to_value(message)
            .map_err(|e| CanvasError::Internal(format!("json encode failed: {e}")))?;
        if let Value::Object(map) = &mut value {
            map.insert("targetModule".into(), Value::String(TARGET_MODULE.into()));
        }
        let text = value.to_string();

        tracing::debug!(target_origin = %origin, bytes = text.len(), "posting message");
        self.host.post_message(target, &text, &origin);
        Ok(())
    }

    /// Install the inbound listener, replacing any previous one.
    pub fn receive(&self, callback: FrameCallback, filter: SourceFilter) {
        let mut slot = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            tracing::debug!("replacing inbound listener");
        }
        *slot = Some(Arc::new(Listener { callback, filter }));
    }

    /// Detach the listener. Idempotent.
    pub fn remove_listener(&self) {
        self.listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn has_listener(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Entry point for every raw message event the host observes.
    /// Returns whether the callback ran.
    pub fn deliver(&self, origin: &str, data: &str) -> bool {
        // Snapshot so the callback may replace or remove the listener.
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(listener) = listener else {
            return false;
        };

        if !listener.filter.allows(origin, data) {
            tracing::trace!(%origin, "inbound origin rejected");
            return false;
        }

        match decode_frame(data) {
            Ok(frame) => {
                (listener.callback)(frame);
                true
            }
            Err(e) => {
                tracing::trace!(%origin, error = %e, "inbound frame dropped");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (FrameCallback, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        (Arc::new(move |_: Value| { h.fetch_add(1, Ordering::SeqCst); }), hits)
    }

    #[test]
    fn send_requires_target_and_strips_it() {
        let host = Arc::new(MemoryHost::new());
        let t = Transport::new(host.clone());

        let err = t.send(&json!({"a": 1}), None, &TargetWindow::Parent).unwrap_err();
        assert!(matches!(err, CanvasError::Precondition(_)));
        assert!(t.send(&json!({"a": 1}), Some(""), &TargetWindow::Parent).is_err());
        assert!(host.posted().is_empty());

        t.send(&json!({"a": 1}), Some("https://p.com:8443/x?y#z"), &TargetWindow::Parent)
            .unwrap();
        let m = host.last_posted().unwrap();
        assert_eq!(m.target_origin, "https://p.com:8443");
        assert_eq!(m.json().unwrap(), json!({"a": 1, "targetModule": "Canvas"}));
    }

    #[test]
    fn named_target_window_reaches_host() {
        let host = Arc::new(MemoryHost::new());
        let t = Transport::new(host.clone());
        let target = TargetWindow::Named("canvas-frame-sibling".into());

        t.send(&json!({"a": 1}), Some("https://p.com/x"), &target).unwrap();
        let m = host.last_posted().unwrap();
        assert_eq!(m.target, target);
        assert_eq!(m.target_origin, "https://p.com");
    }

    #[test]
    fn string_filter_is_exact() {
        let t = Transport::new(Arc::new(MemoryHost::new()));
        let (cb, hits) = counting();
        t.receive(cb, SourceFilter::Origin("https://p.com".into()));

        assert!(!t.deliver("https://p.com:443", r#"{"type":"event"}"#));
        assert!(t.deliver("https://p.com", r#"{"type":"event"}"#));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn predicate_sees_origin_and_raw_data() {
        let t = Transport::new(Arc::new(MemoryHost::new()));
        let (cb, hits) = counting();
        t.receive(
            cb,
            SourceFilter::Predicate(Arc::new(|origin: &str, data: &str| {
                origin.ends_with(".trusted.com") && !data.contains("skip")
            })),
        );

        assert!(t.deliver("https://a.trusted.com", "{}"));
        assert!(!t.deliver("https://a.trusted.com", r#"{"skip":true}"#));
        assert!(!t.deliver("https://evil.com", "{}"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_json_and_foreign_frames_never_reach_callback() {
        let t = Transport::new(Arc::new(MemoryHost::new()));
        let (cb, hits) = counting();
        t.receive(cb, SourceFilter::Any);

        assert!(!t.deliver("https://p.com", "not-json"));
        assert!(!t.deliver("https://p.com", "{oops}"));
        assert!(!t.deliver("https://p.com", r#"{"targetModule":"Other"}"#));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn single_listener_and_idempotent_removal() {
        let t = Transport::new(Arc::new(MemoryHost::new()));
        let (first, first_hits) = counting();
        let (second, second_hits) = counting();
        t.receive(first, SourceFilter::Any);
        t.receive(second, SourceFilter::Any);

        t.deliver("https://p.com", "{}");
        assert_eq!(first_hits.load(Ordering::SeqCst), 0);
        assert_eq!(second_hits.load(Ordering::SeqCst), 1);

        t.remove_listener();
        t.remove_listener();
        assert!(!t.has_listener());
        assert!(!t.deliver("https://p.com", "{}"));
    }
}
