use std::collections::BTreeMap;

use canvasxd_core::error::{CanvasError, Result};
use canvasxd_core::protocol::envelope::{ClientDescriptor, Message, PublishedEvent, SubscriptionParams};
use canvasxd_core::protocol::STREAMING_EVENT;

use super::Client;
use crate::dispatch::{Subscription, SubscriptionTable, Unsubscription};

/// Platform namespaces a frame may subscribe to.
const SUBSCRIBE_EXEMPT: &[&str] = &["canvas", "sfdc"];
const PUBLISH_EXEMPT: &[&str] = &["s1"];

impl Client {
    /// Register subscriptions locally, then tell the parent (unless the
    /// descriptor is a Visualforce one). Every entry is validated before any
    /// is registered.
    pub fn subscribe<I>(&self, client: Option<ClientDescriptor>, subscriptions: I) -> Result<()>
    where
        I: IntoIterator<Item = Subscription>,
    {
        let subs: Vec<Subscription> = subscriptions.into_iter().collect();
        if subs.is_empty() {
            return Err(CanvasError::Precondition("no subscription supplied".into()));
        }
        let client = self.checked_client(client).map_err(CanvasError::InvalidClient)?;

        for s in &subs {
            SubscriptionTable::check(s)?;
            self.inner.event_names.validate(&s.name, SUBSCRIBE_EXEMPT)?;
        }

        let mut wire = BTreeMap::new();
        for s in subs {
            wire.insert(
                s.name.clone(),
                SubscriptionParams {
                    params: s.params.clone(),
                },
            );
            self.inner.subscriptions.insert(s)?;
        }

        if client.is_vf {
            tracing::debug!(count = wire.len(), "visualforce subscribe kept local");
            return Ok(());
        }
        self.postit(
            None,
            Message::Subscribe {
                config: client.into(),
                subscriptions: wire,
            },
        )?;
        Ok(())
    }

    /// Drop subscriptions. Bare names remove the whole entry without name
    /// validation; streaming descriptors remove only their topic.
    pub fn unsubscribe<I, U>(&self, client: Option<ClientDescriptor>, targets: I) -> Result<()>
    where
        I: IntoIterator<Item = U>,
        U: Into<Unsubscription>,
    {
        let targets: Vec<Unsubscription> = targets.into_iter().map(Into::into).collect();
        if targets.is_empty() {
            return Err(CanvasError::Precondition(
                "unsubscribe needs at least one event name".into(),
            ));
        }
        let client = self.checked_client(client).map_err(CanvasError::InvalidClient)?;

        for t in &targets {
            if let Unsubscription::Descriptor { name, params } = t {
                self.inner.event_names.validate(name, SUBSCRIBE_EXEMPT)?;
                let has_topic = params.as_ref().and_then(|p| p.get("topic")).is_some();
                if name == STREAMING_EVENT && !has_topic {
                    return Err(CanvasError::MissingTopic(STREAMING_EVENT.into()));
                }
            }
        }

        let mut wire = BTreeMap::new();
        for t in &targets {
            self.inner.subscriptions.remove(t);
            wire.insert(
                t.name().to_string(),
                SubscriptionParams {
                    params: t.params().cloned(),
                },
            );
        }

        if client.is_vf {
            return Ok(());
        }
        self.postit(
            None,
            Message::Unsubscribe {
                config: client.into(),
                subscriptions: wire,
            },
        )?;
        Ok(())
    }

    /// Fire-and-forget event to the parent.
    pub fn publish(&self, client: Option<ClientDescriptor>, event: PublishedEvent) -> Result<()> {
        if event.name.is_empty() {
            return Err(CanvasError::MissingName);
        }
        self.inner.event_names.validate(&event.name, PUBLISH_EXEMPT)?;
        let client = self.checked_client(client).map_err(CanvasError::InvalidClient)?;
        self.postit(
            None,
            Message::Publish {
                config: client.into(),
                event,
            },
        )?;
        Ok(())
    }
}
