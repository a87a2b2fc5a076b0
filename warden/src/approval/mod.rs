//! Approvals awaiting human sign-off: the [`ApprovalQueue`] state and the
//! [`DecisionWorkflow`] that confirms decisions with the run backend.

mod queue;
mod workflow;

pub use queue::ApprovalQueue;
pub use workflow::DecisionWorkflow;
