//! GovernanceStore: single source of truth for roles, capabilities, policies and MCP servers.
//!
//! **Interaction**: constructed once with an `Arc<dyn GovernanceBackend>` and cloned into
//! whatever needs it; every clone shares the same cell. Updates are optimistic: the local
//! value changes first, and a failed backend write is reconciled by one full
//! [`GovernanceStore::refresh`] rather than a local rollback, so unrelated in-flight edits
//! may be reverted too.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::{debug, warn};

use super::backend::GovernanceBackend;
use crate::error::BackendError;
use crate::policy::PolicyEvaluator;
use crate::types::{AgentRole, Capability, GovernanceSnapshot, McpServer, Policy};

#[derive(Default)]
struct Cell {
    snapshot: GovernanceSnapshot,
    revision: u64,
}

#[derive(Clone)]
pub struct GovernanceStore {
    backend: Arc<dyn GovernanceBackend>,
    cell: Arc<RwLock<Cell>>,
}

/// Replaces the entry whose key matches, or appends.
fn upsert<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T) -> bool) {
    match items.iter_mut().find(|existing| same(existing)) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

impl GovernanceStore {
    pub fn new(backend: Arc<dyn GovernanceBackend>) -> Self {
        Self {
            backend,
            cell: Arc::new(RwLock::new(Cell::default())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Cell> {
        self.cell.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Cell> {
        self.cell.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches all four collections concurrently and replaces them in one write.
    ///
    /// On failure the prior state is kept and the error returned. Overlapping calls are
    /// allowed; the last one to complete wins.
    pub async fn refresh(&self) -> Result<(), BackendError> {
        let fetched = tokio::try_join!(
            self.backend.get_roles(),
            self.backend.get_capabilities(),
            self.backend.get_policies(),
            self.backend.get_mcp_servers(),
        );
        match fetched {
            Ok((roles, capabilities, policies, mcp_servers)) => {
                let mut cell = self.write();
                cell.snapshot = GovernanceSnapshot {
                    roles,
                    capabilities,
                    policies,
                    mcp_servers,
                };
                cell.revision += 1;
                debug!(revision = cell.revision, "governance refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "governance refresh failed; keeping prior state");
                Err(e)
            }
        }
    }

    /// Applies `role` locally (keyed by id), then writes it to the backend.
    ///
    /// # Errors
    ///
    /// Validation errors are returned before anything changes. A backend failure triggers
    /// exactly one reconciling [`refresh`](Self::refresh) and returns the backend error.
    pub async fn update_role(&self, role: AgentRole) -> Result<(), BackendError> {
        role.validate()?;
        {
            let mut cell = self.write();
            upsert(&mut cell.snapshot.roles, role.clone(), |r| r.id == role.id);
            cell.revision += 1;
        }
        debug!(role_id = %role.id, "role updated optimistically");
        if let Err(e) = self.backend.update_role(&role).await {
            warn!(role_id = %role.id, error = %e, "role update rejected; reconciling");
            self.reconcile().await;
            return Err(e);
        }
        Ok(())
    }

    /// Same contract as [`update_role`](Self::update_role), keyed by policy id.
    pub async fn update_policy(&self, policy: Policy) -> Result<(), BackendError> {
        policy.validate()?;
        {
            let mut cell = self.write();
            upsert(&mut cell.snapshot.policies, policy.clone(), |p| p.id == policy.id);
            cell.revision += 1;
        }
        debug!(policy_id = %policy.id, "policy updated optimistically");
        if let Err(e) = self.backend.update_policy(&policy).await {
            warn!(policy_id = %policy.id, error = %e, "policy update rejected; reconciling");
            self.reconcile().await;
            return Err(e);
        }
        Ok(())
    }

    async fn reconcile(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "reconciliation refresh failed; local state may be stale");
        }
    }

    pub fn snapshot(&self) -> GovernanceSnapshot {
        self.read().snapshot.clone()
    }

    /// Increases on every applied change; compare before and after an await to detect
    /// stale results.
    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    pub fn roles(&self) -> Vec<AgentRole> {
        self.read().snapshot.roles.clone()
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        self.read().snapshot.capabilities.clone()
    }

    pub fn policies(&self) -> Vec<Policy> {
        self.read().snapshot.policies.clone()
    }

    pub fn mcp_servers(&self) -> Vec<McpServer> {
        self.read().snapshot.mcp_servers.clone()
    }

    /// Evaluator over the current snapshot.
    pub fn evaluator(&self, approval_ttl: Duration) -> PolicyEvaluator {
        PolicyEvaluator::new(self.snapshot(), approval_ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_or_appends() {
        let mut v = vec![(1, "a"), (2, "b")];
        upsert(&mut v, (2, "B"), |x| x.0 == 2);
        upsert(&mut v, (3, "c"), |x| x.0 == 3);
        assert_eq!(v, vec![(1, "a"), (2, "B"), (3, "c")]);
    }
}
