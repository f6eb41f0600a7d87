//! Client facade.
//!
//! One `Client` per embedded frame owns every piece of mutable state the
//! protocol needs (parent origin cache, pending calls, subscriptions, session)
//! and wires the inbound path: host event -> `Transport::deliver` -> origin
//! filter -> `EventRouter` -> callback/event services.

mod events;
mod frame;
mod services;

use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use canvasxd_core::error::{CanvasError, Result};
use canvasxd_core::protocol::envelope::{ClientDescriptor, Envelope, Message, Response};
use canvasxd_core::protocol::event_name::EventNamePolicy;
use canvasxd_core::protocol::frame::decode_frame;

use crate::config::ClientConfig;
use crate::correlation::{CorrelationRegistry, ResponseCallback};
use crate::dispatch::{EventRouter, SubscriptionTable};
use crate::host::{FrameHost, TargetWindow};
use crate::origin::OriginResolver;
use crate::services::{CallbackService, EventService, ParentVersion};
use crate::session::{KeyValueStore, Session};
use crate::transport::{FrameCallback, SourceFilter, Transport};

pub use frame::{FrameSizeReport, Heights, Widths};
pub use services::{AjaxSettings, VersionInfo};

const REQUIRED_FRAME_TYPES: [&str; 2] = ["callback", "event"];

#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    cfg: ClientConfig,
    event_names: EventNamePolicy,
    host: Arc<dyn FrameHost>,
    session: Arc<Session>,
    transport: Arc<Transport>,
    resolver: Arc<OriginResolver>,
    registry: Arc<CorrelationRegistry>,
    subscriptions: Arc<SubscriptionTable>,
    parent_version: Arc<ParentVersion>,
    signed_request: Mutex<Option<Value>>,
    autogrow_generation: AtomicU64,
}

impl Client {
    /// Build the client and install its inbound listener.
    pub fn new(
        cfg: ClientConfig,
        host: Arc<dyn FrameHost>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        cfg.validate()?;

        let session = Arc::new(Session::new(
            Arc::clone(&host),
            store,
            &cfg.client.login_url,
        ));
        session.init();

        let transport = Arc::new(Transport::new(Arc::clone(&host)));
        let resolver = Arc::new(OriginResolver::new(Arc::clone(&host)));

        let expiring = Arc::clone(&session);
        let registry = Arc::new(CorrelationRegistry::new().with_expiry_hook(move || expiring.logout()));

        let subscriptions = Arc::new(SubscriptionTable::new());
        let parent_version = Arc::new(ParentVersion::default());

        let router = Arc::new(EventRouter::new());
        router.register(Arc::new(CallbackService::new(
            Arc::clone(&registry),
            Arc::clone(&parent_version),
        )));
        router.register(Arc::new(EventService::new(Arc::clone(&subscriptions))));

        let registered = router.registered_types();
        for ty in REQUIRED_FRAME_TYPES {
            if !registered.contains(&ty) {
                return Err(CanvasError::Internal(format!("no handler registered for {ty} frames")));
            }
        }
        tracing::debug!(types = ?registered, "inbound handlers registered");

        let pinned = cfg.client.pin_inbound_origin;
        let filter_resolver = Arc::clone(&resolver);
        // Only frames addressed to this module may pin the parent origin.
        let filter = SourceFilter::Predicate(Arc::new(move |origin: &str, data: &str| {
            decode_frame(data).is_ok() && filter_resolver.accept_inbound(origin, pinned)
        }));
        let on_frame: FrameCallback = Arc::new(move |frame: Value| match router.dispatch(frame) {
            Ok(true) => {}
            Ok(false) => tracing::trace!("inbound frame of unknown type dropped"),
            Err(e) => tracing::debug!(code = e.code().as_str(), error = %e, "inbound frame dropped"),
        });
        transport.receive(on_frame, filter);

        let event_names = cfg.event_names();
        Ok(Self {
            inner: Arc::new(ClientInner {
                cfg,
                event_names,
                host,
                session,
                transport,
                resolver,
                registry,
                subscriptions,
                parent_version,
                signed_request: Mutex::new(None),
                autogrow_generation: AtomicU64::new(0),
            }),
        })
    }

    pub fn cfg(&self) -> &ClientConfig {
        &self.inner.cfg
    }

    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.inner.session)
    }

    pub fn transport(&self) -> Arc<Transport> {
        Arc::clone(&self.inner.transport)
    }

    pub fn origin(&self) -> Arc<OriginResolver> {
        Arc::clone(&self.inner.resolver)
    }

    pub fn subscriptions(&self) -> Arc<SubscriptionTable> {
        Arc::clone(&self.inner.subscriptions)
    }

    /// Feed one raw message event observed by the host binding.
    pub fn deliver(&self, origin: &str, data: &str) -> bool {
        self.inner.transport.deliver(origin, data)
    }

    /// Stop listening for inbound frames.
    pub fn detach(&self) {
        self.inner.transport.remove_listener();
    }

    /// Explicit descriptor, or the session's when none is given. Validation
    /// failures come back as the synthetic response.
    fn checked_client(
        &self,
        client: Option<ClientDescriptor>,
    ) -> std::result::Result<ClientDescriptor, Response> {
        let client = client.unwrap_or_else(|| self.inner.session.client());
        client.validate(self.inner.parent_version.get().as_deref())?;
        Ok(client)
    }

    /// Wrap `message` in an envelope, park `callback` under its seq and post
    /// it to the parent.
    fn postit(&self, callback: Option<ResponseCallback>, message: Message) -> Result<u32> {
        let candidate = message.client().target_origin.clone();
        let target = self.inner.resolver.resolve(candidate.as_deref()).ok_or_else(|| {
            CanvasError::Precondition(
                "targetOrigin was not supplied and was not found on the hash tag".into(),
            )
        })?;

        let kind = message.kind();
        let seq = self.inner.registry.register(callback);
        let envelope = Envelope::new(
            seq,
            &self.inner.cfg.client.client_version,
            self.inner.parent_version.get(),
            message,
        );
        self.inner
            .transport
            .send(&envelope, Some(&target), &TargetWindow::Parent)?;
        tracing::debug!(seq, kind, target_origin = %target, "message posted");
        Ok(seq)
    }
}
