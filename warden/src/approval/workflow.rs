//! DecisionWorkflow: the round trip from a UI decision to backend confirmation.
//!
//! The first pending record with the id is marked, then the decision is submitted. If the
//! backend does not confirm, that record is restored to its previous pending value so the
//! user can act again.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::queue::ApprovalQueue;
use crate::error::DecideError;
use crate::stream::RunBackend;
use crate::types::{Approval, Resolution};

#[derive(Clone)]
pub struct DecisionWorkflow {
    queue: ApprovalQueue,
    backend: Arc<dyn RunBackend>,
}

impl DecisionWorkflow {
    pub fn new(queue: ApprovalQueue, backend: Arc<dyn RunBackend>) -> Self {
        Self { queue, backend }
    }

    /// Decides approval `id` and waits for the backend to confirm.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `AlreadyDecided`: nothing was changed or sent.
    /// - `Expired`: an expired approval cannot be approved (rejecting it is allowed).
    /// - `Backend`: the decision was sent but not confirmed; the record is pending again.
    pub async fn decide(&self, id: &str, resolution: Resolution) -> Result<(), DecideError> {
        self.decide_guarded(id, resolution, |_| true).await
    }

    /// Like [`decide`](Self::decide), but an unconfirmed decision is only undone while
    /// `still_current` holds for the prior record once the backend has answered. Otherwise
    /// the record is left out of the queue and the backend error is still returned.
    pub async fn decide_guarded<F>(
        &self,
        id: &str,
        resolution: Resolution,
        still_current: F,
    ) -> Result<(), DecideError>
    where
        F: FnOnce(&Approval) -> bool,
    {
        let prior = match self.queue.get_pending(id) {
            Some(prior) => prior,
            None if self.queue.get(id).is_some() => {
                return Err(DecideError::AlreadyDecided(id.to_string()));
            }
            None => return Err(DecideError::NotFound(id.to_string())),
        };
        if resolution == Resolution::Approved && prior.is_expired(Utc::now()) {
            return Err(DecideError::Expired(id.to_string()));
        }
        let decided_at = Utc::now();
        if !self.queue.update_approval_status_at(id, resolution, decided_at) {
            return Err(DecideError::AlreadyDecided(id.to_string()));
        }

        let e = match self.backend.submit_decision(id, resolution).await {
            Ok(()) => {
                info!(approval_id = id, %resolution, "decision confirmed");
                return Ok(());
            }
            Err(e) => e,
        };
        if still_current(&prior) {
            warn!(approval_id = id, error = %e, "decision not confirmed; restoring approval");
            self.queue.restore(prior, decided_at);
        } else {
            warn!(
                approval_id = id,
                run_id = %prior.run_id,
                error = %e,
                "decision not confirmed; run is no longer active, approval dropped"
            );
        }
        Err(DecideError::Backend(e))
    }

    /// Removes a decided (or abandoned) approval from the visible list.
    pub fn dismiss(&self, id: &str) -> bool {
        self.queue.remove_approval(id)
    }
}
