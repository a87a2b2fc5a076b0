//! Error taxonomy: validation, backend (transport/status), stream, decision.
//!
//! Nothing here is fatal to the process. Stores keep their prior state and hand the error
//! back to the caller, who decides whether to surface a notice.

use thiserror::Error;

/// A payload that does not match the expected shape. Never coerced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("field `{0}` must not be empty")]
    Empty(&'static str),
    #[error("unknown capability: {0}")]
    UnknownCapability(String),
    #[error("unknown risk level: {0}")]
    UnknownRisk(String),
    #[error("approval {0} expires before it was requested")]
    ExpiryBeforeRequest(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error(transparent)]
    Event(#[from] stream_event::ValidationError),
}

/// Errors from a governance or run backend call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Network unreachable, timeout, connection reset.
    #[error("transport: {0}")]
    Transport(String),
    /// Non-2xx response.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid payload: {0}")]
    Validation(#[from] ValidationError),
}

impl BackendError {
    /// True for failures recovered by keeping prior state (transport and status).
    pub fn is_transport(&self) -> bool {
        !matches!(self, BackendError::Validation(_))
    }
}

/// Errors that terminate a run event subscription.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("stream transport: {0}")]
    Transport(String),
    #[error("invalid event: {0}")]
    Validation(#[from] ValidationError),
    #[error("subscribe failed: {0}")]
    Subscribe(#[from] BackendError),
}

/// Errors from the approval decision round trip.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecideError {
    #[error("no approval with id {0}")]
    NotFound(String),
    #[error("approval {0} is already decided")]
    AlreadyDecided(String),
    #[error("approval {0} has expired")]
    Expired(String),
    #[error("decision not confirmed: {0}")]
    Backend(#[from] BackendError),
}
