//! Governance reference data: capabilities, roles, policies, MCP servers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Closed set of permission units an agent action can fall under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityName {
    CodeExecution,
    ShellExec,
    McpCall,
    ApiCall,
    WebSearch,
    DocsRead,
}

impl CapabilityName {
    pub const ALL: [CapabilityName; 6] = [
        CapabilityName::CodeExecution,
        CapabilityName::ShellExec,
        CapabilityName::McpCall,
        CapabilityName::ApiCall,
        CapabilityName::WebSearch,
        CapabilityName::DocsRead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityName::CodeExecution => "code_execution",
            CapabilityName::ShellExec => "shell_exec",
            CapabilityName::McpCall => "mcp_call",
            CapabilityName::ApiCall => "api_call",
            CapabilityName::WebSearch => "web_search",
            CapabilityName::DocsRead => "docs_read",
        }
    }
}

impl FromStr for CapabilityName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CapabilityName::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| ValidationError::UnknownCapability(s.to_string()))
    }
}

impl fmt::Display for CapabilityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk classification, ordered `Low < Medium < High`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(ValidationError::UnknownRisk(s.to_string())),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named permission unit with its default risk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub name: CapabilityName,
    #[serde(default)]
    pub description: String,
    pub default_risk: RiskLevel,
}

/// A named persona with the capabilities it may use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRole {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<CapabilityName>,
}

impl AgentRole {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, caps: impl IntoIterator<Item = CapabilityName>) -> Self {
        self.capabilities = caps.into_iter().collect();
        self
    }

    pub fn permits(&self, capability: CapabilityName) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::Empty("role.id"));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("role.name"));
        }
        Ok(())
    }
}

/// Matches either every value (`"*"` on the wire) or exactly one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selector<T> {
    Any,
    Exact(T),
}

impl<T: PartialEq> Selector<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selector::Any => true,
            Selector::Exact(v) => v == value,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Selector::Any)
    }
}

impl Selector<String> {
    /// Role selectors compare by role name.
    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            Selector::Any => true,
            Selector::Exact(v) => v == name,
        }
    }
}

impl<T: Serialize> Serialize for Selector<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selector::Any => serializer.serialize_str("*"),
            Selector::Exact(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T> Deserialize<'de> for Selector<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.trim() == "*" {
            return Ok(Selector::Any);
        }
        s.parse::<T>()
            .map(Selector::Exact)
            .map_err(serde::de::Error::custom)
    }
}

/// What a matching policy requires before an action may proceed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyEffect {
    AutoApprove,
    RequireApproval,
    Deny,
}

impl fmt::Display for PolicyEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PolicyEffect::AutoApprove => "auto_approve",
            PolicyEffect::RequireApproval => "require_approval",
            PolicyEffect::Deny => "deny",
        })
    }
}

/// Binds a role (or `*`) and a capability (or `*`) to an effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    pub role: Selector<String>,
    #[serde(alias = "cap")]
    pub capability: Selector<CapabilityName>,
    pub effect: PolicyEffect,
}

impl Policy {
    pub fn new(
        id: impl Into<String>,
        role: Selector<String>,
        capability: Selector<CapabilityName>,
        effect: PolicyEffect,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            capability,
            effect,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::Empty("policy.id"));
        }
        if let Selector::Exact(ref r) = self.role {
            if r.trim().is_empty() {
                return Err(ValidationError::Empty("policy.role"));
            }
        }
        Ok(())
    }
}

/// External tool provider and the tool names it exposes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServer {
    pub name: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl McpServer {
    pub fn exposes(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("mcp_server.name"));
        }
        if self.tools.iter().any(|t| t.trim().is_empty()) {
            return Err(ValidationError::Empty("mcp_server.tools[]"));
        }
        Ok(())
    }
}

/// The four governance collections as of one refresh.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    pub roles: Vec<AgentRole>,
    pub capabilities: Vec<Capability>,
    pub policies: Vec<Policy>,
    pub mcp_servers: Vec<McpServer>,
}

impl GovernanceSnapshot {
    pub fn role_by_name(&self, name: &str) -> Option<&AgentRole> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn capability(&self, name: CapabilityName) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.name == name)
    }

    pub fn risk_of(&self, name: CapabilityName) -> Option<RiskLevel> {
        self.capability(name).map(|c| c.default_risk)
    }

    pub fn server_for_tool(&self, tool: &str) -> Option<&McpServer> {
        self.mcp_servers.iter().find(|s| s.exposes(tool))
    }
}
