//! Console: the explicitly constructed context shared by every console view.
//!
//! Holds governance reference data, the approval queue, the active run's activity and the
//! optional plugins. Only one run is streamed at a time; starting another cancels the
//! previous subscription and clears its approvals.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::approval::{ApprovalQueue, DecisionWorkflow};
use crate::client::ApiClient;
use crate::error::{BackendError, DecideError, StreamError};
use crate::governance::{GovernanceBackend, GovernanceStore, HttpGovernanceBackend};
use crate::plugin::Plugins;
use crate::policy::{PolicyEvaluator, Verdict};
use crate::stream::{
    HttpRunBackend, RunActivity, RunBackend, StreamConsumer, Subscription, SubscriptionHandle,
};
use crate::types::{ApprovalAction, CapabilityName, Resolution, Run, RunStatus};

pub const DEFAULT_APPROVAL_TTL: Duration =
    Duration::from_secs(env_config::DEFAULT_APPROVAL_TTL_SECS);

struct ActiveRun {
    run: Run,
    handle: SubscriptionHandle,
}

pub struct Console {
    governance: GovernanceStore,
    approvals: ApprovalQueue,
    activity: RunActivity,
    plugins: Plugins,
    consumer: StreamConsumer,
    workflow: DecisionWorkflow,
    approval_ttl: Duration,
    active: Mutex<Option<ActiveRun>>,
    /// Bumped each time `start_run` clears the approval queue.
    generation: AtomicU64,
}

impl Console {
    pub fn new(governance: Arc<dyn GovernanceBackend>, runs: Arc<dyn RunBackend>) -> Self {
        let approvals = ApprovalQueue::new();
        let activity = RunActivity::new();
        Self {
            governance: GovernanceStore::new(governance),
            consumer: StreamConsumer::new(runs.clone(), activity.clone(), approvals.clone()),
            workflow: DecisionWorkflow::new(approvals.clone(), runs),
            approvals,
            activity,
            plugins: Plugins::default(),
            approval_ttl: DEFAULT_APPROVAL_TTL,
            active: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// HTTP backends against `settings.api_url`.
    pub fn from_settings(settings: &env_config::Settings) -> Result<Self, BackendError> {
        let client = ApiClient::from_settings(settings)?;
        Ok(Self::new(
            Arc::new(HttpGovernanceBackend::new(client.clone())),
            Arc::new(HttpRunBackend::new(client)),
        )
        .with_approval_ttl(settings.approval_ttl))
    }

    pub fn with_plugins(mut self, plugins: Plugins) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_approval_ttl(mut self, ttl: Duration) -> Self {
        self.approval_ttl = ttl;
        self
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes `run` the active run and subscribes to its events.
    ///
    /// Any previous subscription is cancelled and its activity and approvals are cleared
    /// before subscribing, so a failed subscribe leaves no run active.
    pub async fn start_run(&self, run: Run) -> Result<Subscription, StreamError> {
        if let Some(prev) = self.active().take() {
            prev.handle.cancel();
            debug!(run_id = %prev.run.id, "previous run subscription cancelled");
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.activity.begin_run(&run.id);
        self.approvals.set_pending_approvals(Vec::new());

        let subscription = match self.consumer.open(&run.id).await {
            Ok(s) => s,
            Err(e) => {
                self.activity.end_session();
                return Err(e);
            }
        };
        info!(run_id = %run.id, "run started");
        let replaced = self.active().replace(ActiveRun {
            run,
            handle: subscription.handle(),
        });
        if let Some(prev) = replaced {
            prev.handle.cancel();
        }
        Ok(subscription)
    }

    /// Cancels the active run's subscription and clears its activity.
    pub fn end_run(&self) -> Option<Run> {
        let prev = self.active().take()?;
        prev.handle.cancel();
        self.activity.end_session();
        info!(run_id = %prev.run.id, "run ended");
        Some(prev.run)
    }

    pub fn active_run(&self) -> Option<Run> {
        self.active().as_ref().map(|a| a.run.clone())
    }

    pub fn is_current(&self, run_id: &str) -> bool {
        self.active().as_ref().is_some_and(|a| a.run.id == run_id)
    }

    pub fn evaluator(&self) -> PolicyEvaluator {
        self.governance.evaluator(self.approval_ttl)
    }

    /// Assesses an action the agent proposes in `run_id`. Approvals needed by the active run
    /// are enqueued; a verdict for any other run is returned but not enqueued.
    pub fn propose(
        &self,
        run_id: &str,
        role: &str,
        capability: CapabilityName,
        action: ApprovalAction,
    ) -> Verdict {
        let now = Utc::now();
        let verdict = self.evaluator().assess(run_id, role, capability, action, now);
        if let Verdict::NeedsApproval(ref approval) = verdict {
            let mut active = self.active();
            match active.as_mut().filter(|a| a.run.id == run_id) {
                Some(a) => {
                    a.run.transition(RunStatus::AwaitingApproval, now);
                    self.approvals.add_approval(approval.clone());
                }
                None => debug!(run_id, "approval not enqueued; run is not active"),
            }
        }
        verdict
    }

    /// Decides a queued approval. If the backend does not confirm, the approval is pending
    /// again unless a different run was started while the decision was in flight; the new
    /// run's queue never receives the old run's record.
    pub async fn decide(
        &self,
        approval_id: &str,
        resolution: Resolution,
    ) -> Result<(), DecideError> {
        let generation = self.generation.load(Ordering::SeqCst);
        self.workflow
            .decide_guarded(approval_id, resolution, |prior| {
                self.generation.load(Ordering::SeqCst) == generation
                    && self
                        .active()
                        .as_ref()
                        .map_or(true, |a| a.run.id == prior.run_id)
            })
            .await?;
        let mut active = self.active();
        if let Some(a) = active.as_mut() {
            if a.run.status == RunStatus::AwaitingApproval && self.approvals.pending().is_empty() {
                a.run.transition(RunStatus::Running, Utc::now());
            }
        }
        Ok(())
    }

    pub fn dismiss(&self, approval_id: &str) -> bool {
        self.workflow.dismiss(approval_id)
    }

    pub fn governance(&self) -> &GovernanceStore {
        &self.governance
    }

    pub fn approvals(&self) -> &ApprovalQueue {
        &self.approvals
    }

    pub fn activity(&self) -> &RunActivity {
        &self.activity
    }

    pub fn plugins(&self) -> &Plugins {
        &self.plugins
    }

    pub fn approval_ttl(&self) -> Duration {
        self.approval_ttl
    }
}
