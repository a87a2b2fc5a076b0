//! Policy evaluation: which approval requirement applies to a (role, capability, risk).
//!
//! ## Precedence
//!
//! | Rank | Match | Example |
//! |------|-------|---------|
//! | 1 | `(role, capability)` | `Developer` + `shell_exec` |
//! | 2 | `(role, *)` | `Developer` + anything |
//! | 3 | `(*, capability)` | anyone + `shell_exec` |
//! | 4 | `(*, *)` | catch-all |
//!
//! The first match at the highest rank wins. With no match, [`DEFAULT_EFFECTS`] decides by
//! risk: `low` auto-approves, `medium` and `high` require approval.
//!
//! [`evaluate`] is pure and takes the policy list directly; [`PolicyEvaluator`] wraps a
//! [`GovernanceSnapshot`](crate::types::GovernanceSnapshot) and also builds the
//! [`Approval`](crate::types::Approval) for actions that need one.

mod evaluator;
mod rules;

pub use evaluator::{PolicyEvaluator, Verdict};
pub use rules::{
    default_effect, evaluate, evaluate_detailed, specificity, Evaluation, Specificity,
    DEFAULT_EFFECTS,
};
