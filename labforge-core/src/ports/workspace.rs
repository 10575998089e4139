// labforge-core/src/ports/workspace.rs

// What the reconciler needs from the remote workspace, without knowing
// whether it is the REST API or an in-memory stand-in.

use crate::domain::permission::PermissionLevel;
use crate::domain::policy::PolicyDefinition;
use crate::domain::pool::InstancePoolSpec;
use crate::domain::resource::{InstancePoolId, PolicyId, Upserted};
use crate::error::LabforgeError;
use async_trait::async_trait;

#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    /// Deletes the pool called `name` if there is one. Returns whether a pool
    /// was deleted; a missing pool is not an error.
    async fn delete_instance_pool_by_name(&self, name: &str) -> Result<bool, LabforgeError>;

    async fn create_or_update_instance_pool(
        &self,
        spec: &InstancePoolSpec,
    ) -> Result<Upserted<InstancePoolId>, LabforgeError>;

    async fn create_or_update_cluster_policy(
        &self,
        name: &str,
        definition: &PolicyDefinition,
    ) -> Result<Upserted<PolicyId>, LabforgeError>;

    async fn update_pool_group_permission(
        &self,
        pool_id: &InstancePoolId,
        group: &str,
        level: PermissionLevel,
    ) -> Result<(), LabforgeError>;

    async fn update_policy_group_permission(
        &self,
        policy_id: &PolicyId,
        group: &str,
        level: PermissionLevel,
    ) -> Result<(), LabforgeError>;
}
