//! Boundary validation for inbound run events.
//!
//! Malformed input is rejected with a descriptive [`ValidationError`]; nothing is coerced.

use thiserror::Error;

use crate::event::{EventKind, RunEvent};

/// Errors while validating an inbound event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed event: {0}")]
    Malformed(String),
    #[error("event field `{0}` must not be empty")]
    EmptyField(&'static str),
}

/// Parses one JSON message into a [`RunEvent`].
///
/// # Errors
///
/// - `ValidationError::Malformed` when the text is not a JSON event object.
/// - `ValidationError::EmptyField` when `id`, `run_id` or `kind` is blank.
pub fn parse_event(text: &str) -> Result<RunEvent, ValidationError> {
    let event: RunEvent =
        serde_json::from_str(text).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    validate(&event)?;
    Ok(event)
}

/// Checks required fields of an already-decoded event.
pub fn validate(event: &RunEvent) -> Result<(), ValidationError> {
    if event.id.trim().is_empty() {
        return Err(ValidationError::EmptyField("id"));
    }
    if event.run_id.trim().is_empty() {
        return Err(ValidationError::EmptyField("run_id"));
    }
    if let EventKind::Custom(ref k) = event.kind {
        if k.trim().is_empty() {
            return Err(ValidationError::EmptyField("kind"));
        }
    }
    Ok(())
}
