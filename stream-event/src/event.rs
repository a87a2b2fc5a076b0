//! Run event types: kind + payload, scoped to one run.
//!
//! Kinds are carried on the wire as snake_case strings. Unknown kinds are kept as
//! [`EventKind::Custom`] so newer servers do not break older consoles.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event class of one run event.
///
/// Derived console state is keyed on these classes:
/// - `thought` / `thinking_started` start the "agent is thinking" indicator
/// - `thinking_complete` and every terminal kind stop it
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Thought,
    ThinkingStarted,
    ThinkingComplete,
    ToolCall,
    ToolResult,
    StatusChange,
    Message,
    ApprovalRequired,
    Done,
    Failed,
    Cancelled,
    Custom(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Thought => "thought",
            EventKind::ThinkingStarted => "thinking_started",
            EventKind::ThinkingComplete => "thinking_complete",
            EventKind::ToolCall => "tool_call",
            EventKind::ToolResult => "tool_result",
            EventKind::StatusChange => "status_change",
            EventKind::Message => "message",
            EventKind::ApprovalRequired => "approval_required",
            EventKind::Done => "done",
            EventKind::Failed => "failed",
            EventKind::Cancelled => "cancelled",
            EventKind::Custom(s) => s.as_str(),
        }
    }

    /// True for kinds that set the thinking indicator.
    pub fn starts_thinking(&self) -> bool {
        matches!(self, EventKind::Thought | EventKind::ThinkingStarted)
    }

    /// True for kinds that clear the thinking indicator.
    pub fn ends_thinking(&self) -> bool {
        matches!(self, EventKind::ThinkingComplete) || self.is_terminal()
    }

    /// Terminal kinds end the run; nothing follows them in the feed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventKind::Done | EventKind::Failed | EventKind::Cancelled
        )
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        match s {
            "thought" => EventKind::Thought,
            "thinking_started" => EventKind::ThinkingStarted,
            "thinking_complete" => EventKind::ThinkingComplete,
            "tool_call" => EventKind::ToolCall,
            "tool_result" => EventKind::ToolResult,
            "status_change" => EventKind::StatusChange,
            "message" => EventKind::Message,
            "approval_required" => EventKind::ApprovalRequired,
            "done" => EventKind::Done,
            "failed" => EventKind::Failed,
            "cancelled" => EventKind::Cancelled,
            other => EventKind::Custom(other.to_string()),
        }
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        EventKind::from(s.as_str())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Custom(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable event emitted during a run.
///
/// Note on naming: `id` is the event id; `run_id` is the run it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub id: String,
    pub run_id: String,
    pub kind: EventKind,
    #[serde(default)]
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl RunEvent {
    pub fn new(
        id: impl Into<String>,
        run_id: impl Into<String>,
        kind: EventKind,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            run_id: run_id.into(),
            kind,
            payload: Value::Null,
            timestamp,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Text of a thought line: the payload itself when it is a string, else `payload.text`.
    pub fn thought_text(&self) -> Option<&str> {
        match &self.payload {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => obj.get("text").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Approval record carried by an `approval_required` event (`payload.approval`, or the
    /// whole payload when it has no such key).
    pub fn approval_payload(&self) -> Option<&Value> {
        if self.kind != EventKind::ApprovalRequired {
            return None;
        }
        match self.payload.get("approval") {
            Some(v) => Some(v),
            None if self.payload.is_object() => Some(&self.payload),
            None => None,
        }
    }

    /// Serializes this event to a JSON object.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
