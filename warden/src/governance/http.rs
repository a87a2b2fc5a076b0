//! HTTP governance backend.
//!
//! | Call | Request |
//! |------|---------|
//! | `get_roles` | `GET /roles` |
//! | `get_capabilities` | `GET /capabilities` |
//! | `get_policies` | `GET /policies` |
//! | `get_mcp_servers` | `GET /mcp-servers` |
//! | `update_role` | `PUT /roles/{id}` |
//! | `update_policy` | `PUT /policies/{id}` |

use async_trait::async_trait;
use reqwest::Method;

use super::backend::GovernanceBackend;
use crate::client::ApiClient;
use crate::error::{BackendError, ValidationError};
use crate::types::{AgentRole, Capability, McpServer, Policy};

pub struct HttpGovernanceBackend {
    client: ApiClient,
}

impl HttpGovernanceBackend {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

fn validate_all<T>(
    items: Vec<T>,
    check: impl Fn(&T) -> Result<(), ValidationError>,
) -> Result<Vec<T>, BackendError> {
    for item in &items {
        check(item)?;
    }
    Ok(items)
}

#[async_trait]
impl GovernanceBackend for HttpGovernanceBackend {
    async fn get_roles(&self) -> Result<Vec<AgentRole>, BackendError> {
        validate_all(self.client.get_json("/roles").await?, AgentRole::validate)
    }

    async fn get_capabilities(&self) -> Result<Vec<Capability>, BackendError> {
        self.client.get_json("/capabilities").await
    }

    async fn get_policies(&self) -> Result<Vec<Policy>, BackendError> {
        validate_all(self.client.get_json("/policies").await?, Policy::validate)
    }

    async fn get_mcp_servers(&self) -> Result<Vec<McpServer>, BackendError> {
        validate_all(self.client.get_json("/mcp-servers").await?, McpServer::validate)
    }

    async fn update_role(&self, role: &AgentRole) -> Result<(), BackendError> {
        self.client
            .send_json(Method::PUT, &format!("/roles/{}", role.id), role)
            .await
    }

    async fn update_policy(&self, policy: &Policy) -> Result<(), BackendError> {
        self.client
            .send_json(Method::PUT, &format!("/policies/{}", policy.id), policy)
            .await
    }
}
