//! # Warden
//!
//! Approval and risk governance core for a console that supervises autonomous coding
//! agents. It decides which agent actions need human sign-off, holds the queue of pending
//! approvals, and consumes each run's live event feed.
//!
//! ## Design principles
//!
//! - **Explicit context**: every store is a cloneable handle passed to whoever needs it;
//!   [`Console`] bundles them. No globals.
//! - **Backends behind traits**: [`GovernanceBackend`] and [`RunBackend`] have HTTP
//!   implementations ([`HttpGovernanceBackend`], [`HttpRunBackend`]) and in-memory mocks
//!   ([`MockGovernanceBackend`], [`MockRunBackend`]).
//! - **Nothing fatal**: failed fetches keep prior state; failed optimistic writes reconcile
//!   with one refresh; unconfirmed decisions restore the approval.
//!
//! ## Main modules
//!
//! - [`types`]: [`Run`], [`Approval`], [`AgentRole`], [`Capability`], [`Policy`], [`McpServer`].
//! - [`policy`]: [`evaluate`] (pure precedence rules) and [`PolicyEvaluator`] ([`Verdict`]).
//! - [`governance`]: [`GovernanceStore`] with optimistic
//!   [`update_role`](GovernanceStore::update_role) and
//!   [`update_policy`](GovernanceStore::update_policy).
//! - [`approval`]: [`ApprovalQueue`] and the [`DecisionWorkflow`] round trip.
//! - [`stream`]: [`StreamConsumer`], [`Subscription`], [`RunActivity`].
//! - [`plugin`]: optional billing/auth slots ([`Plugins`], [`ConsolePlugin`]).
//! - [`console`]: [`Console`].

pub mod approval;
pub mod client;
pub mod console;
pub mod error;
pub mod governance;
pub mod plugin;
pub mod policy;
pub mod stream;
pub mod types;

pub use approval::{ApprovalQueue, DecisionWorkflow};
pub use client::ApiClient;
pub use console::{Console, DEFAULT_APPROVAL_TTL};
pub use error::{BackendError, DecideError, StreamError, ValidationError};
pub use governance::{
    FetchCounts, GovernanceBackend, GovernanceStore, HttpGovernanceBackend, MockGovernanceBackend,
};
pub use plugin::{Availability, ConsolePlugin, PluginSlot, Plugins};
pub use policy::{
    default_effect, evaluate, evaluate_detailed, Evaluation, PolicyEvaluator, Specificity,
    Verdict, DEFAULT_EFFECTS,
};
pub use stream::{
    EventStream, FeedSender, HttpRunBackend, MockRunBackend, RunActivity, RunBackend,
    StreamConsumer, StreamEnd, Subscription, SubscriptionHandle,
};
pub use types::{
    ActionKind, AgentRole, Approval, ApprovalAction, ApprovalState, Capability, CapabilityName,
    Decision, EventKind, GovernanceSnapshot, McpServer, Policy, PolicyEffect, Resolution,
    RiskLevel, Run, RunEvent, RunStatus, Selector,
};

/// Initializes tracing from `RUST_LOG` for unit tests in `src/**`, so `--nocapture` shows logs.
#[cfg(test)]
mod test_logging {
    use ctor::ctor;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::Layer;

    #[ctor]
    fn init() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_filter(filter),
            )
            .try_init();
    }
}
