//! Inbound frame handlers, one per frame `type`.

pub mod callback;
pub mod event;

pub use callback::{CallbackService, ParentVersion};
pub use event::EventService;
