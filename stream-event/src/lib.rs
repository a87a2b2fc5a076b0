//! Run event protocol: one event per message (id + run_id + kind + payload + timestamp).
//!
//! This crate defines the wire shape of a single run event, validates it at the boundary and
//! decodes server-sent-event frames. It does not depend on warden; the core consumes
//! [`RunEvent`] values produced here.

pub mod envelope;
pub mod event;
pub mod parse;
pub mod sse;

pub use envelope::EventSequence;
pub use event::{EventKind, RunEvent};
pub use parse::{parse_event, ValidationError};
pub use sse::{FrameResult, SseDecoder, SseFrame};
