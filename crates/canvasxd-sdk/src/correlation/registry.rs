use std::sync::{Mutex, PoisonError};

use canvasxd_core::protocol::envelope::Response;

/// Ring size: ids `0..=100`.
pub const REGISTRY_SLOTS: usize = 101;

/// Invoked at most once with the parent's answer.
pub type ResponseCallback = Box<dyn FnOnce(Response) + Send + 'static>;

type ExpiryHook = Box<dyn Fn() + Send + Sync>;

struct Ring {
    next: usize,
    slots: Vec<Option<ResponseCallback>>,
}

/// Fixed-size ring of pending callbacks.
///
/// - `register` takes the next slot (wrapping after 100) and overwrites
///   whatever was parked there; an unanswered call is only ever reclaimed this
///   way.
/// - `resolve` takes the callback out before running it, so a late or
///   duplicate response for the same slot is dropped.
/// - A `401 INVALID_SESSION_ID` response fires the expiry hook before the
///   callback runs.
pub struct CorrelationRegistry {
    ring: Mutex<Ring>,
    on_session_expired: Option<ExpiryHook>,
}

impl Default for CorrelationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationRegistry {
    pub fn new() -> Self {
        Self {
            ring: Mutex::new(Ring {
                next: 0,
                slots: (0..REGISTRY_SLOTS).map(|_| None).collect(),
            }),
            on_session_expired: None,
        }
    }

    pub fn with_expiry_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_session_expired = Some(Box::new(hook));
        self
    }

    /// Claim the next slot. Fire-and-forget calls pass `None` and still
    /// consume a sequence number.
    pub fn register(&self, callback: Option<ResponseCallback>) -> u32 {
        let mut ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = ring.next;
        ring.next = (seq + 1) % REGISTRY_SLOTS;
        if ring.slots[seq].is_some() {
            tracing::debug!(seq, "overwriting unanswered pending call");
        }
        ring.slots[seq] = callback;
        seq as u32
    }

    /// Route a response to its parked callback. Returns whether one ran.
    pub fn resolve(&self, seq: u32, response: Response) -> bool {
        if response.is_invalid_session() {
            tracing::info!(seq, "session expired; logging out");
            if let Some(hook) = &self.on_session_expired {
                hook();
            }
        }

        // Lock released before the callback runs; it may issue new calls.
        let callback = {
            let mut ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
            ring.slots.get_mut(seq as usize).and_then(Option::take)
        };

        match callback {
            Some(cb) => {
                cb(response);
                true
            }
            None => {
                tracing::trace!(seq, "no pending call for response");
                false
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .slots
            .iter()
            .filter(|s| s.is_some())
            .count()
    }
}
