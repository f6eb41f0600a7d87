//! Subscription table: `name -> subscription`, with the streaming event keyed
//! one level further by `params.topic`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{json, Value};

use canvasxd_core::error::{CanvasError, Result};
use canvasxd_core::protocol::frame::{EventMethod, EventNotice};
use canvasxd_core::protocol::STREAMING_EVENT;

/// Callback for `onData` / `onComplete`.
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// A named subscription and its handlers.
#[derive(Clone)]
pub struct Subscription {
    pub name: String,
    pub params: Option<Value>,
    on_data: Option<EventHandler>,
    on_complete: Option<EventHandler>,
}

impl Subscription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: None,
            on_data: None,
            on_complete: None,
        }
    }

    /// Streaming subscription for one topic.
    pub fn streaming(topic: impl Into<String>) -> Self {
        Self::new(STREAMING_EVENT).params(json!({ "topic": topic.into() }))
    }

    pub fn params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn on_data(mut self, f: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_data = Some(Arc::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(f));
        self
    }

    pub fn topic(&self) -> Option<&str> {
        self.params
            .as_ref()
            .and_then(|p| p.get("topic"))
            .and_then(Value::as_str)
    }

    pub fn is_streaming(&self) -> bool {
        self.name == STREAMING_EVENT
    }

    fn has_handler(&self) -> bool {
        self.on_data.is_some() || self.on_complete.is_some()
    }

    fn handler(&self, method: EventMethod) -> Option<&EventHandler> {
        match method {
            EventMethod::OnData => self.on_data.as_ref(),
            EventMethod::OnComplete => self.on_complete.as_ref(),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("on_data", &self.on_data.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// What to remove: a whole name, or a descriptor whose topic narrows a
/// streaming subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum Unsubscription {
    Name(String),
    Descriptor { name: String, params: Option<Value> },
}

impl Unsubscription {
    pub fn topic(topic: impl Into<String>) -> Self {
        Unsubscription::Descriptor {
            name: STREAMING_EVENT.to_string(),
            params: Some(json!({ "topic": topic.into() })),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Unsubscription::Name(n) | Unsubscription::Descriptor { name: n, .. } => n,
        }
    }

    pub fn params(&self) -> Option<&Value> {
        match self {
            Unsubscription::Name(_) => None,
            Unsubscription::Descriptor { params, .. } => params.as_ref(),
        }
    }
}

impl From<&str> for Unsubscription {
    fn from(name: &str) -> Self {
        Unsubscription::Name(name.to_string())
    }
}

impl From<String> for Unsubscription {
    fn from(name: String) -> Self {
        Unsubscription::Name(name)
    }
}

impl From<&Subscription> for Unsubscription {
    fn from(s: &Subscription) -> Self {
        Unsubscription::Descriptor {
            name: s.name.clone(),
            params: s.params.clone(),
        }
    }
}

impl From<Subscription> for Unsubscription {
    fn from(s: Subscription) -> Self {
        Unsubscription::Descriptor {
            name: s.name,
            params: s.params,
        }
    }
}

enum Entry {
    Single(Arc<Subscription>),
    Topics(HashMap<String, Arc<Subscription>>),
}

#[derive(Default)]
pub struct SubscriptionTable {
    entries: DashMap<String, Entry>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Streaming subscriptions must carry `params.topic`.
    pub fn check(sub: &Subscription) -> Result<()> {
        if sub.name.is_empty() {
            return Err(CanvasError::MissingName);
        }
        if sub.is_streaming() && sub.topic().is_none() {
            return Err(CanvasError::MissingTopic(STREAMING_EVENT.into()));
        }
        Ok(())
    }

    /// Insert or replace. A second subscription to the same name (or the same
    /// streaming topic) replaces the first.
    pub fn insert(&self, sub: Subscription) -> Result<()> {
        Self::check(&sub)?;

        if let Some(topic) = sub.topic().filter(|_| sub.is_streaming()).map(str::to_string) {
            let mut entry = self
                .entries
                .entry(sub.name.clone())
                .or_insert_with(|| Entry::Topics(HashMap::new()));
            match entry.value_mut() {
                Entry::Topics(topics) => {
                    topics.insert(topic, Arc::new(sub));
                }
                single => {
                    let mut topics = HashMap::new();
                    topics.insert(topic, Arc::new(sub));
                    *single = Entry::Topics(topics);
                }
            }
            return Ok(());
        }

        self.entries
            .insert(sub.name.clone(), Entry::Single(Arc::new(sub)));
        Ok(())
    }

    /// Remove per the target: bare names drop the whole entry, streaming
    /// descriptors drop their topic and the entry once it is empty.
    pub fn remove(&self, target: &Unsubscription) {
        let name = target.name();
        let topic = target
            .params()
            .and_then(|p| p.get("topic"))
            .and_then(Value::as_str);

        match (name == STREAMING_EVENT, target, topic) {
            (true, Unsubscription::Descriptor { .. }, Some(topic)) => {
                if let Some(mut entry) = self.entries.get_mut(name) {
                    if let Entry::Topics(topics) = entry.value_mut() {
                        topics.remove(topic);
                    }
                }
                self.entries
                    .remove_if(name, |_, e| matches!(e, Entry::Topics(t) if t.is_empty()));
            }
            _ => {
                self.entries.remove(name);
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of live subscriptions, counting each streaming topic.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .map(|e| match e.value() {
                Entry::Single(_) => 1,
                Entry::Topics(t) => t.len(),
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscription a notice is addressed to, if it has any handler.
    pub fn find(&self, notice: &EventNotice) -> Option<Arc<Subscription>> {
        let entry = self.entries.get(&notice.name)?;
        let sub = match entry.value() {
            Entry::Single(s) if !notice.is_streaming() => Arc::clone(s),
            Entry::Topics(topics) if notice.is_streaming() => {
                Arc::clone(topics.get(notice.topic()?)?)
            }
            _ => return None,
        };
        sub.has_handler().then_some(sub)
    }

    /// Invoke the matching handler. The subscription is snapshotted and no
    /// table guard is held while the handler runs, so handlers may
    /// (un)subscribe freely.
    pub fn dispatch(&self, notice: &EventNotice) -> bool {
        let Some(sub) = self.find(notice) else {
            tracing::trace!(name = %notice.name, "no subscription for event");
            return false;
        };
        let Some(handler) = notice.method().and_then(|m| sub.handler(m)).cloned() else {
            tracing::trace!(name = %notice.name, method = ?notice.method, "no handler for method");
            return false;
        };
        handler(&notice.payload);
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn notice(name: &str, topic: Option<&str>, method: &str, payload: Value) -> EventNotice {
        EventNotice {
            name: name.to_string(),
            params: topic.map(|t| json!({ "topic": t })),
            method: Some(method.to_string()),
            payload,
        }
    }

    #[test]
    fn on_data_exactly_once_with_payload() {
        let table = SubscriptionTable::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        table
            .insert(Subscription::new("mynamespace.someevent").on_data(move |v| {
                s.lock().unwrap().push(v.clone());
            }))
            .unwrap();

        assert!(table.dispatch(&notice("mynamespace.someevent", None, "onData", json!({"x": 1}))));
        assert_eq!(*seen.lock().unwrap(), vec![json!({"x": 1})]);
    }

    #[test]
    fn streaming_topics_are_independent() {
        let table = SubscriptionTable::new();
        let t1 = Arc::new(AtomicUsize::new(0));
        let t2 = Arc::new(AtomicUsize::new(0));
        let (a, b) = (Arc::clone(&t1), Arc::clone(&t2));
        table
            .insert(Subscription::streaming("T1").on_data(move |_| {
                a.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        table
            .insert(Subscription::streaming("T2").on_data(move |_| {
                b.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        assert!(table.dispatch(&notice(STREAMING_EVENT, Some("T1"), "onData", Value::Null)));
        assert_eq!(t1.load(Ordering::SeqCst), 1);
        assert_eq!(t2.load(Ordering::SeqCst), 0);
        assert!(!table.dispatch(&notice(STREAMING_EVENT, Some("T3"), "onData", Value::Null)));
        assert_eq!(table.len(), 2);

        table.remove(&Unsubscription::topic("T1"));
        assert!(table.contains(STREAMING_EVENT));
        table.remove(&Unsubscription::topic("T2"));
        assert!(!table.contains(STREAMING_EVENT));
    }

    #[test]
    fn streaming_requires_topic() {
        let table = SubscriptionTable::new();
        let err = table.insert(Subscription::new(STREAMING_EVENT).on_data(|_| {})).unwrap_err();
        assert!(matches!(err, CanvasError::MissingTopic(_)));
        assert!(table.is_empty());
    }

    #[test]
    fn method_selects_handler_and_handlerless_is_skipped() {
        let table = SubscriptionTable::new();
        let completes = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&completes);
        table
            .insert(Subscription::new("ns.done").on_complete(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        table.insert(Subscription::new("ns.silent")).unwrap();

        assert!(!table.dispatch(&notice("ns.done", None, "onData", Value::Null)));
        assert!(table.dispatch(&notice("ns.done", None, "onComplete", Value::Null)));
        assert!(!table.dispatch(&notice("ns.silent", None, "onData", Value::Null)));
        assert!(!table.dispatch(&notice("ns.done", None, "onSomethingElse", Value::Null)));
        assert_eq!(completes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_may_unsubscribe_itself() {
        let table = Arc::new(SubscriptionTable::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let (t, h) = (Arc::clone(&table), Arc::clone(&hits));
        table
            .insert(Subscription::new("ns.once").on_data(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
                t.remove(&Unsubscription::from("ns.once"));
            }))
            .unwrap();

        assert!(table.dispatch(&notice("ns.once", None, "onData", Value::Null)));
        assert!(!table.dispatch(&notice("ns.once", None, "onData", Value::Null)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
