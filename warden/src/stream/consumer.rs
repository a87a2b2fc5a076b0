//! StreamConsumer: bridges a run's event feed into [`RunActivity`] and the [`ApprovalQueue`].
//!
//! One [`Subscription`] per run. It appends events in arrival order, forwards each
//! `approval_required` payload to the queue once per approval id, and stops on a terminal
//! event, end of feed, cancellation or the first error. It never reconnects on its own;
//! callers that want retries open a new subscription.

use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::activity::RunActivity;
use super::backend::{EventStream, RunBackend};
use crate::approval::ApprovalQueue;
use crate::error::{StreamError, ValidationError};
use crate::types::{Approval, EventKind, RunEvent};

/// Why a subscription stopped without error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEnd {
    /// A terminal event (`done`, `failed`, `cancelled`) arrived.
    Completed(EventKind),
    /// The feed ended without a terminal event.
    Closed,
    /// [`Subscription::cancel`] or a [`SubscriptionHandle`] stopped it.
    Cancelled,
}

#[derive(Clone)]
pub struct StreamConsumer {
    backend: Arc<dyn RunBackend>,
    activity: RunActivity,
    approvals: ApprovalQueue,
}

impl StreamConsumer {
    pub fn new(
        backend: Arc<dyn RunBackend>,
        activity: RunActivity,
        approvals: ApprovalQueue,
    ) -> Self {
        Self {
            backend,
            activity,
            approvals,
        }
    }

    /// Subscribes to `run_id`'s feed. Does not reset [`RunActivity`]; callers starting a new
    /// run call [`RunActivity::begin_run`] first.
    pub async fn open(&self, run_id: &str) -> Result<Subscription, StreamError> {
        let stream = self.backend.subscribe(run_id).await?;
        info!(run_id, "run subscription opened");
        Ok(Subscription {
            run_id: run_id.to_string(),
            stream,
            token: CancellationToken::new(),
            activity: self.activity.clone(),
            approvals: self.approvals.clone(),
            seen_approvals: HashSet::new(),
            end: None,
        })
    }
}

/// Cloneable cancel handle for a [`Subscription`].
#[derive(Clone, Debug)]
pub struct SubscriptionHandle {
    run_id: String,
    token: CancellationToken,
}

impl SubscriptionHandle {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// A live, cancellable subscription to one run's events.
pub struct Subscription {
    run_id: String,
    stream: EventStream,
    token: CancellationToken,
    activity: RunActivity,
    approvals: ApprovalQueue,
    seen_approvals: HashSet<String>,
    /// Set once the subscription has stopped; later calls report it again.
    end: Option<StreamEnd>,
}

impl Subscription {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn handle(&self) -> SubscriptionHandle {
        SubscriptionHandle {
            run_id: self.run_id.clone(),
            token: self.token.clone(),
        }
    }

    /// Idempotent; safe to call after the subscription already ended.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits for and delivers the next event. `None` once the subscription has ended.
    pub async fn next_event(&mut self) -> Option<Result<RunEvent, StreamError>> {
        match self.step().await {
            Step::Event(event) => Some(Ok(event)),
            Step::Failed(e) => Some(Err(e)),
            Step::Ended(_) => None,
        }
    }

    /// Drains the feed until it ends.
    ///
    /// # Errors
    ///
    /// The first transport or validation error terminates the subscription and is returned.
    pub async fn run(&mut self) -> Result<StreamEnd, StreamError> {
        loop {
            match self.step().await {
                Step::Event(_) => continue,
                Step::Failed(e) => return Err(e),
                Step::Ended(end) => return Ok(end),
            }
        }
    }

    async fn step(&mut self) -> Step {
        if let Some(ref end) = self.end {
            return Step::Ended(end.clone());
        }
        loop {
            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => None,
                item = self.stream.next() => Some(item),
            };
            let Some(item) = next else {
                self.end = Some(StreamEnd::Cancelled);
                info!(run_id = %self.run_id, "run subscription cancelled");
                return Step::Ended(StreamEnd::Cancelled);
            };
            match item {
                None => {
                    self.end = Some(StreamEnd::Closed);
                    info!(run_id = %self.run_id, "run feed closed");
                    return Step::Ended(StreamEnd::Closed);
                }
                Some(Err(e)) => {
                    self.end = Some(StreamEnd::Closed);
                    warn!(run_id = %self.run_id, error = %e, "run feed failed");
                    return Step::Failed(e);
                }
                Some(Ok(event)) => {
                    if event.run_id != self.run_id {
                        debug!(event_id = %event.id, "ignoring event for another run");
                        continue;
                    }
                    if let Err(e) = self.deliver(&event) {
                        self.end = Some(StreamEnd::Closed);
                        warn!(
                            run_id = %self.run_id,
                            event_id = %event.id,
                            error = %e,
                            "invalid event"
                        );
                        return Step::Failed(e);
                    }
                    if event.kind.is_terminal() {
                        self.end = Some(StreamEnd::Completed(event.kind.clone()));
                        info!(run_id = %self.run_id, kind = %event.kind, "run ended");
                    }
                    return Step::Event(event);
                }
            }
        }
    }

    fn deliver(&mut self, event: &RunEvent) -> Result<(), StreamError> {
        let approval = match event.approval_payload() {
            Some(payload) => Some(Approval::from_value(payload)?),
            None if event.kind == EventKind::ApprovalRequired => {
                return Err(ValidationError::Malformed(format!(
                    "approval_required event {} has no approval",
                    event.id
                ))
                .into());
            }
            None => None,
        };
        if let Some(ref approval) = approval {
            if approval.run_id != event.run_id {
                return Err(ValidationError::Malformed(format!(
                    "approval {} belongs to run {}, not {}",
                    approval.id, approval.run_id, event.run_id
                ))
                .into());
            }
        }
        if !self.activity.apply(event) {
            return Ok(());
        }
        if let Some(approval) = approval {
            if self.seen_approvals.insert(approval.id.clone()) {
                self.approvals.add_approval(approval);
            } else {
                debug!(approval_id = %approval.id, "approval already forwarded; skipping replay");
            }
        }
        Ok(())
    }
}

enum Step {
    Event(RunEvent),
    Failed(StreamError),
    Ended(StreamEnd),
}
