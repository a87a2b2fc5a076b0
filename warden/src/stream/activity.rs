//! RunActivity: the event log and derived "agent is thinking" state of the active run.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::types::RunEvent;

#[derive(Debug, Default)]
struct Activity {
    run_id: Option<String>,
    events: Vec<RunEvent>,
    thinking: bool,
    thoughts: Vec<String>,
}

/// Shared, cloneable view of the active run's activity.
///
/// Events are appended in arrival order. `thought` / `thinking_started` set the thinking
/// flag; `thinking_complete` and terminal events clear it. Thought lines accumulate until
/// the next [`begin_run`](Self::begin_run) or [`clear_thoughts`](Self::clear_thoughts).
#[derive(Clone, Default)]
pub struct RunActivity {
    cell: Arc<RwLock<Activity>>,
}

impl RunActivity {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Activity> {
        self.cell.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Activity> {
        self.cell.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes `run_id` the active run and clears everything from the previous one.
    pub fn begin_run(&self, run_id: &str) {
        *self.write() = Activity {
            run_id: Some(run_id.to_string()),
            ..Activity::default()
        };
    }

    /// Clears the active run (session ended).
    pub fn end_session(&self) {
        *self.write() = Activity::default();
    }

    /// Appends `event` and updates derived state. Events for any run other than the active
    /// one are dropped; returns whether the event was applied.
    pub fn apply(&self, event: &RunEvent) -> bool {
        let mut a = self.write();
        if a.run_id.as_deref() != Some(event.run_id.as_str()) {
            debug!(event_id = %event.id, run_id = %event.run_id, "dropping event for inactive run");
            return false;
        }
        if event.kind.starts_thinking() {
            a.thinking = true;
        } else if event.kind.ends_thinking() {
            a.thinking = false;
        }
        if let Some(text) = event.thought_text().filter(|_| event.kind.starts_thinking()) {
            a.thoughts.push(text.to_string());
        }
        a.events.push(event.clone());
        true
    }

    pub fn clear_thoughts(&self) {
        self.write().thoughts.clear();
    }

    pub fn active_run(&self) -> Option<String> {
        self.read().run_id.clone()
    }

    pub fn is_thinking(&self) -> bool {
        self.read().thinking
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.read().events.clone()
    }

    pub fn thoughts(&self) -> Vec<String> {
        self.read().thoughts.clone()
    }

    pub fn event_count(&self) -> usize {
        self.read().events.len()
    }
}
