//! PolicyEvaluator: turns a proposed action into a verdict using one governance snapshot.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::rules::{evaluate_detailed, Evaluation};
use crate::types::{
    Approval, ApprovalAction, CapabilityName, GovernanceSnapshot, PolicyEffect, RiskLevel,
};

/// Longest approval window accepted; longer TTLs are clamped.
const MAX_APPROVAL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Result of assessing one proposed action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Auto-approved; the agent may proceed.
    Proceed(Evaluation),
    /// Needs human sign-off; the approval is ready to enqueue.
    NeedsApproval(Approval),
    /// Not permitted.
    Denied { reason: String },
}

/// Evaluates proposed actions against a snapshot of roles, capabilities and policies.
///
/// Risk comes from the capability's registered default; an unregistered capability is
/// treated as `high`. A registered role that does not list the capability is denied before
/// policies are consulted.
#[derive(Clone, Debug)]
pub struct PolicyEvaluator {
    snapshot: GovernanceSnapshot,
    approval_ttl: Duration,
}

impl PolicyEvaluator {
    pub fn new(snapshot: GovernanceSnapshot, approval_ttl: Duration) -> Self {
        Self {
            snapshot,
            approval_ttl: approval_ttl.min(MAX_APPROVAL_TTL),
        }
    }

    pub fn snapshot(&self) -> &GovernanceSnapshot {
        &self.snapshot
    }

    pub fn risk_for(&self, capability: CapabilityName) -> RiskLevel {
        self.snapshot.risk_of(capability).unwrap_or(RiskLevel::High)
    }

    /// Effect for the pair, without building an approval.
    pub fn evaluate(&self, role: &str, capability: CapabilityName) -> Evaluation {
        evaluate_detailed(
            &self.snapshot.policies,
            role,
            capability,
            self.risk_for(capability),
        )
    }

    /// Assesses `action` proposed in `run_id` by an agent acting as `role`.
    pub fn assess(
        &self,
        run_id: &str,
        role: &str,
        capability: CapabilityName,
        action: ApprovalAction,
        now: DateTime<Utc>,
    ) -> Verdict {
        if let Some(r) = self.snapshot.role_by_name(role) {
            if !r.permits(capability) {
                debug!(role, %capability, "capability not granted to role");
                return Verdict::Denied {
                    reason: format!("role {} is not granted {}", role, capability),
                };
            }
        }

        let risk = self.risk_for(capability);
        let evaluation = evaluate_detailed(&self.snapshot.policies, role, capability, risk);
        let rule = match evaluation.matched_policy {
            Some(ref id) => format!("policy {}", id),
            None => format!("default for {} risk", risk),
        };
        debug!(role, %capability, effect = %evaluation.effect, %rule, "policy evaluated");

        match evaluation.effect {
            PolicyEffect::AutoApprove => Verdict::Proceed(evaluation),
            PolicyEffect::Deny => Verdict::Denied {
                reason: format!("{} denied for role {} by {}", capability, role, rule),
            },
            PolicyEffect::RequireApproval => {
                let ttl = chrono::Duration::from_std(self.approval_ttl)
                    .unwrap_or_else(|_| chrono::Duration::days(7));
                Verdict::NeedsApproval(Approval::new(
                    uuid::Uuid::new_v4().to_string(),
                    run_id,
                    capability,
                    risk,
                    format!("{} requires approval for role {} ({})", capability, role, rule),
                    action,
                    now,
                    ttl,
                ))
            }
        }
    }
}
