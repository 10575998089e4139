// labforge-core/src/infrastructure/adapters/memory.rs

// In-process workspace. Backs `--dry-run` and the reconciler tests: same
// contract as the REST client, nothing leaves the process.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::domain::permission::{GroupGrant, PermissionLevel};
use crate::domain::policy::PolicyDefinition;
use crate::domain::pool::InstancePoolSpec;
use crate::domain::resource::{InstancePoolId, PolicyId, ResourceKind, Upserted};
use crate::error::LabforgeError;
use crate::ports::workspace::WorkspaceApi;

#[derive(Debug, Clone)]
pub struct StoredPool {
    pub id: InstancePoolId,
    pub spec: InstancePoolSpec,
}

#[derive(Debug, Clone)]
pub struct StoredPolicy {
    pub id: PolicyId,
    pub name: String,
    pub definition: PolicyDefinition,
}

#[derive(Debug, Clone)]
pub struct StoredGrant {
    pub kind: ResourceKind,
    pub resource_id: String,
    pub grant: GroupGrant,
}

#[derive(Debug, Default)]
struct MemoryState {
    pools: Vec<StoredPool>,
    policies: Vec<StoredPolicy>,
    grants: Vec<StoredGrant>,
    next_id: u64,
}

impl MemoryState {
    fn mint(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{:06}", prefix, self.next_id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryWorkspace {
    state: Mutex<MemoryState>,
}

impl InMemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, LabforgeError> {
        self.state
            .lock()
            .map_err(|_| LabforgeError::InternalError("in-memory workspace lock poisoned".into()))
    }

    // Inspection helpers read through a poisoned lock: the data is still
    // the last consistent write.
    fn peek(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn pools_named(&self, name: &str) -> Vec<StoredPool> {
        self.peek()
            .pools
            .iter()
            .filter(|p| p.spec.name == name)
            .cloned()
            .collect()
    }

    pub fn policies_named(&self, name: &str) -> Vec<StoredPolicy> {
        self.peek()
            .policies
            .iter()
            .filter(|p| p.name == name)
            .cloned()
            .collect()
    }

    pub fn grants_for(&self, resource_id: &str) -> Vec<StoredGrant> {
        self.peek()
            .grants
            .iter()
            .filter(|g| g.resource_id == resource_id)
            .cloned()
            .collect()
    }

    pub fn pool_count(&self) -> usize {
        self.peek().pools.len()
    }

    pub fn policy_count(&self) -> usize {
        self.peek().policies.len()
    }

    fn record_grant(
        &self,
        kind: ResourceKind,
        resource_id: &str,
        group: &str,
        level: PermissionLevel,
    ) -> Result<(), LabforgeError> {
        let mut state = self.state()?;
        let exists = match kind {
            ResourceKind::InstancePool => state.pools.iter().any(|p| p.id.as_str() == resource_id),
            ResourceKind::ClusterPolicy => state.policies.iter().any(|p| p.id.as_str() == resource_id),
        };
        if !exists {
            return Err(LabforgeError::InternalError(format!(
                "cannot grant on unknown {} '{}'",
                kind, resource_id
            )));
        }

        // Same group on the same resource: last grant wins, like the PATCH endpoint
        state
            .grants
            .retain(|g| !(g.resource_id == resource_id && g.grant.group_name == group));
        state.grants.push(StoredGrant {
            kind,
            resource_id: resource_id.to_string(),
            grant: GroupGrant::new(group, level),
        });
        Ok(())
    }
}

#[async_trait]
impl WorkspaceApi for InMemoryWorkspace {
    async fn delete_instance_pool_by_name(&self, name: &str) -> Result<bool, LabforgeError> {
        let mut state = self.state()?;
        let removed: Vec<String> = state
            .pools
            .iter()
            .filter(|p| p.spec.name == name)
            .map(|p| p.id.as_str().to_string())
            .collect();

        state.pools.retain(|p| p.spec.name != name);
        state.grants.retain(|g| !removed.contains(&g.resource_id));

        debug!(name, removed = removed.len(), "🧪 in-memory pool delete");
        Ok(!removed.is_empty())
    }

    async fn create_or_update_instance_pool(
        &self,
        spec: &InstancePoolSpec,
    ) -> Result<Upserted<InstancePoolId>, LabforgeError> {
        let mut state = self.state()?;
        if let Some(existing) = state.pools.iter_mut().find(|p| p.spec.name == spec.name) {
            existing.spec = spec.clone();
            return Ok(Upserted::updated(existing.id.clone()));
        }

        let id = InstancePoolId::new(state.mint("pool"));
        state.pools.push(StoredPool {
            id: id.clone(),
            spec: spec.clone(),
        });
        Ok(Upserted::created(id))
    }

    async fn create_or_update_cluster_policy(
        &self,
        name: &str,
        definition: &PolicyDefinition,
    ) -> Result<Upserted<PolicyId>, LabforgeError> {
        let mut state = self.state()?;
        if let Some(existing) = state.policies.iter_mut().find(|p| p.name == name) {
            existing.definition = definition.clone();
            return Ok(Upserted::updated(existing.id.clone()));
        }

        let id = PolicyId::new(state.mint("policy"));
        state.policies.push(StoredPolicy {
            id: id.clone(),
            name: name.to_string(),
            definition: definition.clone(),
        });
        Ok(Upserted::created(id))
    }

    async fn update_pool_group_permission(
        &self,
        pool_id: &InstancePoolId,
        group: &str,
        level: PermissionLevel,
    ) -> Result<(), LabforgeError> {
        self.record_grant(ResourceKind::InstancePool, pool_id.as_str(), group, level)
    }

    async fn update_policy_group_permission(
        &self,
        policy_id: &PolicyId,
        group: &str,
        level: PermissionLevel,
    ) -> Result<(), LabforgeError> {
        self.record_grant(ResourceKind::ClusterPolicy, policy_id.as_str(), group, level)
    }
}
