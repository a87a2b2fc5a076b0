use async_trait::async_trait;

use crate::error::BackendError;
use crate::types::{AgentRole, Capability, McpServer, Policy};

/// Source of truth for governance data.
///
/// Reads are idempotent; updates are keyed by entity id.
#[async_trait]
pub trait GovernanceBackend: Send + Sync {
    async fn get_roles(&self) -> Result<Vec<AgentRole>, BackendError>;
    async fn get_capabilities(&self) -> Result<Vec<Capability>, BackendError>;
    async fn get_policies(&self) -> Result<Vec<Policy>, BackendError>;
    async fn get_mcp_servers(&self) -> Result<Vec<McpServer>, BackendError>;
    async fn update_role(&self, role: &AgentRole) -> Result<(), BackendError>;
    async fn update_policy(&self, policy: &Policy) -> Result<(), BackendError>;
}
