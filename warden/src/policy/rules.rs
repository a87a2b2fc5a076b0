//! Pure policy matching: (role, capability, risk) → effect.

use crate::types::{CapabilityName, Policy, PolicyEffect, RiskLevel};

/// Effect applied when no policy matches, per capability risk.
pub const DEFAULT_EFFECTS: [(RiskLevel, PolicyEffect); 3] = [
    (RiskLevel::Low, PolicyEffect::AutoApprove),
    (RiskLevel::Medium, PolicyEffect::RequireApproval),
    (RiskLevel::High, PolicyEffect::RequireApproval),
];

/// Looks `risk` up in [`DEFAULT_EFFECTS`].
pub fn default_effect(risk: RiskLevel) -> PolicyEffect {
    DEFAULT_EFFECTS
        .iter()
        .find(|(r, _)| *r == risk)
        .map(|(_, e)| *e)
        .unwrap_or(PolicyEffect::RequireApproval)
}

/// How specific a matching policy is. Later variants win.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Specificity {
    /// `(*, *)`
    Wildcard,
    /// `(*, capability)`
    CapabilityOnly,
    /// `(role, *)`
    RoleOnly,
    /// `(role, capability)`
    Exact,
}

/// Specificity of `policy` for the pair, or `None` if it does not match.
pub fn specificity(policy: &Policy, role: &str, capability: CapabilityName) -> Option<Specificity> {
    if !policy.role.matches_name(role) || !policy.capability.matches(&capability) {
        return None;
    }
    Some(match (policy.role.is_any(), policy.capability.is_any()) {
        (false, false) => Specificity::Exact,
        (false, true) => Specificity::RoleOnly,
        (true, false) => Specificity::CapabilityOnly,
        (true, true) => Specificity::Wildcard,
    })
}

/// Outcome of one evaluation, with the rule that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub effect: PolicyEffect,
    /// Id of the winning policy; `None` when the default table decided.
    pub matched_policy: Option<String>,
    pub specificity: Option<Specificity>,
}

impl Evaluation {
    pub fn is_default(&self) -> bool {
        self.matched_policy.is_none()
    }
}

/// Evaluates `policies` for the pair. The most specific match wins; among equally specific
/// matches the earliest in `policies` wins. With no match, [`default_effect`] of `risk`.
pub fn evaluate_detailed(
    policies: &[Policy],
    role: &str,
    capability: CapabilityName,
    risk: RiskLevel,
) -> Evaluation {
    let mut best: Option<(Specificity, &Policy)> = None;
    for policy in policies {
        let Some(s) = specificity(policy, role, capability) else {
            continue;
        };
        if best.map_or(true, |(b, _)| s > b) {
            best = Some((s, policy));
        }
    }
    match best {
        Some((s, policy)) => Evaluation {
            effect: policy.effect,
            matched_policy: Some(policy.id.clone()),
            specificity: Some(s),
        },
        None => Evaluation {
            effect: default_effect(risk),
            matched_policy: None,
            specificity: None,
        },
    }
}

/// Effect only; see [`evaluate_detailed`].
pub fn evaluate(
    policies: &[Policy],
    role: &str,
    capability: CapabilityName,
    risk: RiskLevel,
) -> PolicyEffect {
    evaluate_detailed(policies, role, capability, risk).effect
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Selector;

    fn policy(
        id: &str,
        role: Option<&str>,
        cap: Option<CapabilityName>,
        effect: PolicyEffect,
    ) -> Policy {
        Policy::new(
            id,
            role.map_or(Selector::Any, |r| Selector::Exact(r.to_string())),
            cap.map_or(Selector::Any, Selector::Exact),
            effect,
        )
    }

    #[test]
    fn default_table_is_explicit() {
        assert_eq!(default_effect(RiskLevel::Low), PolicyEffect::AutoApprove);
        assert_eq!(default_effect(RiskLevel::Medium), PolicyEffect::RequireApproval);
        assert_eq!(default_effect(RiskLevel::High), PolicyEffect::RequireApproval);
        assert_eq!(DEFAULT_EFFECTS.len(), 3);
    }

    #[test]
    fn specificity_order() {
        assert!(Specificity::Exact > Specificity::RoleOnly);
        assert!(Specificity::RoleOnly > Specificity::CapabilityOnly);
        assert!(Specificity::CapabilityOnly > Specificity::Wildcard);
    }

    #[test]
    fn most_specific_wins_regardless_of_order() {
        let policies = vec![
            policy("any", None, None, PolicyEffect::Deny),
            policy("cap", None, Some(CapabilityName::ShellExec), PolicyEffect::RequireApproval),
            policy("role", Some("Developer"), None, PolicyEffect::AutoApprove),
            policy("exact", Some("Developer"), Some(CapabilityName::ShellExec), PolicyEffect::Deny),
        ];
        let e = evaluate_detailed(
            &policies,
            "Developer",
            CapabilityName::ShellExec,
            RiskLevel::Low,
        );
        assert_eq!(e.matched_policy.as_deref(), Some("exact"));
        assert_eq!(e.effect, PolicyEffect::Deny);

        let e = evaluate_detailed(&policies, "Developer", CapabilityName::DocsRead, RiskLevel::Low);
        assert_eq!(e.matched_policy.as_deref(), Some("role"));

        let e = evaluate_detailed(&policies, "QA", CapabilityName::ShellExec, RiskLevel::Low);
        assert_eq!(e.matched_policy.as_deref(), Some("cap"));

        let e = evaluate_detailed(&policies, "QA", CapabilityName::WebSearch, RiskLevel::Low);
        assert_eq!(e.matched_policy.as_deref(), Some("any"));
        assert_eq!(e.specificity, Some(Specificity::Wildcard));
    }

    #[test]
    fn first_of_equal_specificity_wins() {
        let policies = vec![
            policy("first", Some("Architect"), None, PolicyEffect::AutoApprove),
            policy("second", Some("Architect"), None, PolicyEffect::Deny),
        ];
        let e = evaluate_detailed(&policies, "Architect", CapabilityName::ApiCall, RiskLevel::High);
        assert_eq!(e.matched_policy.as_deref(), Some("first"));
        assert_eq!(e.effect, PolicyEffect::AutoApprove);
    }

    #[test]
    fn no_match_falls_back_to_default() {
        let e = evaluate_detailed(&[], "QA", CapabilityName::McpCall, RiskLevel::Medium);
        assert!(e.is_default());
        assert_eq!(e.effect, PolicyEffect::RequireApproval);
    }
}
