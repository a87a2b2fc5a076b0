//! Domain types shared by the stores: runs, approvals, roles, capabilities, policies,
//! MCP servers. Run events come from the `stream-event` crate.

mod approval;
mod governance;
mod run;

pub use approval::{
    ActionKind, Approval, ApprovalAction, ApprovalState, Decision, Resolution,
};
pub use governance::{
    AgentRole, Capability, CapabilityName, GovernanceSnapshot, McpServer, Policy, PolicyEffect,
    RiskLevel, Selector,
};
pub use run::{Run, RunStatus};
pub use stream_event::{EventKind, RunEvent};
