//! EventSequence stamps run id, sequential event ids and timestamps onto events.
//!
//! Producers (test feeds, mock backends, replay tools) use it so that every event of a run
//! carries the same `run_id` and a monotonically increasing id.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::event::{EventKind, RunEvent};

/// Sequence state for one run: run id and next event number.
pub struct EventSequence {
    pub run_id: String,
    pub next_seq: u64,
}

impl EventSequence {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            next_seq: 1,
        }
    }

    /// Builds the next event stamped with the current time.
    pub fn next(&mut self, kind: EventKind, payload: Value) -> RunEvent {
        self.next_at(kind, payload, Utc::now())
    }

    /// Builds the next event with an explicit timestamp. Ids are `<run_id>-<seq>`.
    pub fn next_at(
        &mut self,
        kind: EventKind,
        payload: Value,
        timestamp: DateTime<Utc>,
    ) -> RunEvent {
        let id = format!("{}-{}", self.run_id, self.next_seq);
        self.next_seq += 1;
        RunEvent::new(id, self.run_id.clone(), kind, timestamp).with_payload(payload)
    }
}
