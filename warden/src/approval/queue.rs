//! ApprovalQueue: approvals awaiting a human decision for the active run.
//!
//! The queue never de-duplicates and never raises errors; reconciling with the backend is
//! the caller's job (see [`DecisionWorkflow`](super::DecisionWorkflow)). A decision mutates
//! the record in place so it can be shown as decided before it is removed.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::{Approval, Resolution};

#[derive(Clone, Default)]
pub struct ApprovalQueue {
    cell: Arc<RwLock<Vec<Approval>>>,
}

impl ApprovalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Approval>> {
        self.cell.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Approval>> {
        self.cell.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the whole set (run load, reconnect).
    pub fn set_pending_approvals(&self, approvals: Vec<Approval>) {
        debug!(count = approvals.len(), "pending approvals replaced");
        *self.write() = approvals;
    }

    /// Appends one approval. Ids are not checked for duplicates.
    pub fn add_approval(&self, approval: Approval) {
        debug!(approval_id = %approval.id, capability = %approval.capability, "approval added");
        self.write().push(approval);
    }

    /// Drops every record with `id`. Returns whether anything was removed.
    pub fn remove_approval(&self, id: &str) -> bool {
        let mut items = self.write();
        let before = items.len();
        items.retain(|a| a.id != id);
        before != items.len()
    }

    /// Resolves the first pending record with `id`, stamping `decided_at` now.
    ///
    /// No-op (returns false) when no pending record has that id; decided records are never
    /// touched again.
    pub fn update_approval_status(&self, id: &str, resolution: Resolution) -> bool {
        self.update_approval_status_at(id, resolution, Utc::now())
    }

    pub fn update_approval_status_at(
        &self,
        id: &str,
        resolution: Resolution,
        at: DateTime<Utc>,
    ) -> bool {
        let mut items = self.write();
        let changed = items
            .iter_mut()
            .find(|a| a.id == id && !a.is_decided())
            .map(|a| a.decide(resolution, at))
            .unwrap_or(false);
        if changed {
            debug!(approval_id = id, %resolution, "approval decided");
        }
        changed
    }

    /// Undoes a decision stamped at `decided_at`: the record with `approval`'s id and that
    /// stamp is replaced by `approval`. Appends when that record is gone.
    pub fn restore(&self, approval: Approval, decided_at: DateTime<Utc>) {
        let mut items = self.write();
        match items
            .iter_mut()
            .find(|a| a.id == approval.id && a.decided_at == Some(decided_at))
        {
            Some(slot) => *slot = approval,
            None => items.push(approval),
        }
    }

    /// All records in insertion order, decided ones included.
    pub fn approvals(&self) -> Vec<Approval> {
        self.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<Approval> {
        self.read().iter().find(|a| a.id == id).cloned()
    }

    /// First undecided record with `id`, expired or not.
    pub fn get_pending(&self, id: &str) -> Option<Approval> {
        self.read()
            .iter()
            .find(|a| a.id == id && !a.is_decided())
            .cloned()
    }

    /// Undecided records not yet expired at `now`.
    pub fn pending_at(&self, now: DateTime<Utc>) -> Vec<Approval> {
        self.read()
            .iter()
            .filter(|a| !a.is_decided() && !a.is_expired(now))
            .cloned()
            .collect()
    }

    pub fn pending(&self) -> Vec<Approval> {
        self.pending_at(Utc::now())
    }

    /// Undecided records past their expiry at `now`.
    pub fn expired(&self, now: DateTime<Utc>) -> Vec<Approval> {
        self.read()
            .iter()
            .filter(|a| a.is_expired(now))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
