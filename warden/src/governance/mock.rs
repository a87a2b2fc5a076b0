//! In-memory governance backend for tests and offline demos.
//!
//! Holds the "server" copy of the data, counts every call and can be told to fail reads or
//! writes. Successful updates are applied to the server copy.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::backend::GovernanceBackend;
use crate::error::BackendError;
use crate::types::{AgentRole, Capability, GovernanceSnapshot, McpServer, Policy};

/// Number of fetch calls per collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchCounts {
    pub roles: usize,
    pub capabilities: usize,
    pub policies: usize,
    pub mcp_servers: usize,
}

#[derive(Default)]
struct MockState {
    data: GovernanceSnapshot,
    fetch_failure: Option<BackendError>,
    update_failure: Option<BackendError>,
    counts: FetchCounts,
    role_updates: Vec<AgentRole>,
    policy_updates: Vec<Policy>,
}

#[derive(Default)]
pub struct MockGovernanceBackend {
    state: Mutex<MockState>,
}

impl MockGovernanceBackend {
    pub fn new(data: GovernanceSnapshot) -> Self {
        Self {
            state: Mutex::new(MockState {
                data,
                ..MockState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the server copy (e.g. another client edited it).
    pub fn set_data(&self, data: GovernanceSnapshot) {
        self.lock().data = data;
    }

    pub fn data(&self) -> GovernanceSnapshot {
        self.lock().data.clone()
    }

    /// Makes every fetch fail with `error` until cleared with `None`.
    pub fn set_fetch_failure(&self, error: Option<BackendError>) {
        self.lock().fetch_failure = error;
    }

    /// Makes every update fail with `error` until cleared with `None`.
    pub fn set_update_failure(&self, error: Option<BackendError>) {
        self.lock().update_failure = error;
    }

    pub fn fetch_counts(&self) -> FetchCounts {
        self.lock().counts
    }

    /// Roles received by `update_role`, in call order (including failed calls).
    pub fn role_updates(&self) -> Vec<AgentRole> {
        self.lock().role_updates.clone()
    }

    pub fn policy_updates(&self) -> Vec<Policy> {
        self.lock().policy_updates.clone()
    }

    fn fetch<T>(
        &self,
        bump: impl FnOnce(&mut FetchCounts),
        read: impl FnOnce(&GovernanceSnapshot) -> T,
    ) -> Result<T, BackendError> {
        let mut state = self.lock();
        bump(&mut state.counts);
        if let Some(ref e) = state.fetch_failure {
            return Err(e.clone());
        }
        Ok(read(&state.data))
    }
}

#[async_trait]
impl GovernanceBackend for MockGovernanceBackend {
    async fn get_roles(&self) -> Result<Vec<AgentRole>, BackendError> {
        self.fetch(|c| c.roles += 1, |d| d.roles.clone())
    }

    async fn get_capabilities(&self) -> Result<Vec<Capability>, BackendError> {
        self.fetch(|c| c.capabilities += 1, |d| d.capabilities.clone())
    }

    async fn get_policies(&self) -> Result<Vec<Policy>, BackendError> {
        self.fetch(|c| c.policies += 1, |d| d.policies.clone())
    }

    async fn get_mcp_servers(&self) -> Result<Vec<McpServer>, BackendError> {
        self.fetch(|c| c.mcp_servers += 1, |d| d.mcp_servers.clone())
    }

    async fn update_role(&self, role: &AgentRole) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.role_updates.push(role.clone());
        if let Some(ref e) = state.update_failure {
            return Err(e.clone());
        }
        match state.data.roles.iter_mut().find(|r| r.id == role.id) {
            Some(slot) => *slot = role.clone(),
            None => state.data.roles.push(role.clone()),
        }
        Ok(())
    }

    async fn update_policy(&self, policy: &Policy) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.policy_updates.push(policy.clone());
        if let Some(ref e) = state.update_failure {
            return Err(e.clone());
        }
        match state.data.policies.iter_mut().find(|p| p.id == policy.id) {
            Some(slot) => *slot = policy.clone(),
            None => state.data.policies.push(policy.clone()),
        }
        Ok(())
    }
}
