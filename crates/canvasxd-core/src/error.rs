//! Shared error type across canvasxd crates.

use thiserror::Error;

use crate::protocol::envelope::Response;
use crate::protocol::event_name::EventNameError;

/// Stable error codes (API surface for embedders and logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Caller-code defect (missing url, callback, or target origin).
    Precondition,
    /// Client descriptor lacks a token.
    Unauthorized,
    /// Client descriptor lacks instance id or target origin.
    BadRequest,
    /// Event name failed the grammar or hit a reserved namespace.
    InvalidEventName,
    /// Inbound frame could not be decoded.
    Protocol,
    /// Configuration rejected.
    Config,
    /// Unsupported configuration version.
    UnsupportedVersion,
    /// Anything else.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Precondition => "PRECONDITION",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::InvalidEventName => "INVALID_EVENT_NAME",
            ErrorCode::Protocol => "PROTOCOL",
            ErrorCode::Config => "CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CanvasError>;

/// Unified error type used by core and sdk.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("precondition failed: {0}")]
    Precondition(String),
    /// Descriptor validation failed; carries the synthetic response that
    /// ajax/ctx would have delivered to their callback instead.
    #[error("invalid client: {} {}", .0.status.unwrap_or_default(), .0.status_text.as_deref().unwrap_or(""))]
    InvalidClient(Response),
    #[error(transparent)]
    InvalidEventName(#[from] EventNameError),
    #[error("[{0}] topic is missing")]
    MissingTopic(String),
    #[error("subscription does not have a 'name'")]
    MissingName,
    #[error("malformed frame: {0}")]
    Protocol(String),
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl CanvasError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            CanvasError::Precondition(_) => ErrorCode::Precondition,
            CanvasError::InvalidClient(r) if r.status == Some(401) => ErrorCode::Unauthorized,
            CanvasError::InvalidClient(_) => ErrorCode::BadRequest,
            CanvasError::InvalidEventName(_)
            | CanvasError::MissingTopic(_)
            | CanvasError::MissingName => ErrorCode::InvalidEventName,
            CanvasError::Protocol(_) => ErrorCode::Protocol,
            CanvasError::Config(_) => ErrorCode::Config,
            CanvasError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            CanvasError::Internal(_) => ErrorCode::Internal,
        }
    }
}
