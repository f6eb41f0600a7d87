//! Parent origin resolution.
//!
//! The parent's origin reaches the frame opportunistically: in a client
//! descriptor, in a URL-fragment hint, or as the origin of the first inbound
//! message. Whatever is learned is cached for the lifetime of the client.

use std::sync::{Arc, PoisonError, RwLock};

use canvasxd_core::protocol::hash::decode_hash;
use canvasxd_core::protocol::url::{starts_with_http, strip_url};

use crate::host::FrameHost;

const WILDCARD: &str = "*";

pub struct OriginResolver {
    host: Arc<dyn FrameHost>,
    cached: RwLock<Option<String>>,
}

impl OriginResolver {
    pub fn new(host: Arc<dyn FrameHost>) -> Self {
        Self {
            host,
            cached: RwLock::new(None),
        }
    }

    pub fn cached(&self) -> Option<String> {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cache `url` (stripped) if it is an http(s) URL.
    pub fn adopt(&self, url: &str) -> bool {
        match strip_url(url) {
            Some(origin) if starts_with_http(&origin) => {
                let mut cached = self.cached.write().unwrap_or_else(PoisonError::into_inner);
                if cached.as_deref() != Some(origin.as_str()) {
                    tracing::debug!(%origin, "parent origin cached");
                }
                *cached = Some(origin);
                true
            }
            _ => false,
        }
    }

    /// Origin to post to. `*` passes through untouched and is never cached.
    pub fn resolve(&self, candidate: Option<&str>) -> Option<String> {
        match candidate {
            Some(WILDCARD) => return Some(WILDCARD.to_string()),
            Some(c) if self.adopt(c) => return self.cached(),
            _ => {}
        }

        if let Some(origin) = self.cached() {
            return Some(origin);
        }

        let hash = self.host.location_hash()?;
        let hint = decode_hash(&hash);
        if self.adopt(&hint) {
            return self.cached();
        }
        None
    }

    /// Inbound origin check.
    ///
    /// Pinned: the first origin is trusted when nothing is cached yet, later
    /// frames must match the cached origin. Unpinned: every origin is adopted
    /// and accepted.
    pub fn accept_inbound(&self, origin: &str, pinned: bool) -> bool {
        if !pinned {
            self.adopt(origin);
            return true;
        }
        match (self.cached(), strip_url(origin)) {
            (Some(cached), Some(seen)) => cached == seen,
            (None, Some(_)) => self.adopt(origin),
            (_, None) => false,
        }
    }
}
