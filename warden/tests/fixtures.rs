//! Shared governance data and approvals for integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use warden::{
    ActionKind, AgentRole, Approval, ApprovalAction, Capability, CapabilityName,
    GovernanceSnapshot, McpServer, Policy, PolicyEffect, RiskLevel, Selector,
};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

pub fn capability(name: CapabilityName, risk: RiskLevel) -> Capability {
    Capability {
        name,
        description: String::new(),
        default_risk: risk,
    }
}

pub fn developer() -> AgentRole {
    AgentRole::new("role-dev", "Developer").with_capabilities([
        CapabilityName::CodeExecution,
        CapabilityName::ShellExec,
        CapabilityName::McpCall,
        CapabilityName::DocsRead,
    ])
}

pub fn qa() -> AgentRole {
    AgentRole::new("role-qa", "QA")
        .with_capabilities([CapabilityName::ShellExec, CapabilityName::DocsRead])
}

pub fn dev_shell_policy() -> Policy {
    Policy::new(
        "p-dev-shell",
        Selector::Exact("Developer".to_string()),
        Selector::Exact(CapabilityName::ShellExec),
        PolicyEffect::RequireApproval,
    )
}

pub fn snapshot() -> GovernanceSnapshot {
    GovernanceSnapshot {
        roles: vec![developer(), qa()],
        capabilities: vec![
            capability(CapabilityName::ShellExec, RiskLevel::High),
            capability(CapabilityName::CodeExecution, RiskLevel::Medium),
            capability(CapabilityName::DocsRead, RiskLevel::Low),
        ],
        policies: vec![dev_shell_policy()],
        mcp_servers: vec![McpServer {
            name: "github".to_string(),
            tools: vec!["create_issue".to_string()],
            url: None,
        }],
    }
}

pub fn shell(command: &str) -> ApprovalAction {
    ApprovalAction::new(ActionKind::ShellCommand, "agent", command)
}

pub fn approval(id: &str, run_id: &str) -> Approval {
    Approval::new(
        id,
        run_id,
        CapabilityName::ShellExec,
        RiskLevel::High,
        "shell_exec requires approval",
        shell("rm -rf build"),
        t0(),
        Duration::minutes(15),
    )
}

/// An approval whose window is still open now.
pub fn fresh_approval(id: &str, run_id: &str) -> Approval {
    Approval::new(
        id,
        run_id,
        CapabilityName::ShellExec,
        RiskLevel::High,
        "shell_exec requires approval",
        shell("cargo publish"),
        Utc::now(),
        Duration::minutes(15),
    )
}
