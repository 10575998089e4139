// labforge-core/src/application/provisioning.rs

// Public entry points of the library: one call per provisioned slot, plus a
// sequential `setup` that builds a whole lab. Nothing is rolled back: a
// failure leaves earlier slots in place and re-running converges.

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::application::ports::DisplayChannel;
use crate::application::reconciler::{ReconcileOutcome, Reconciler};
use crate::domain::error::DomainError;
use crate::domain::policy::{
    PolicyArchetype, PolicyDefinition, all_purpose_definition, dlt_definition, jobs_definition,
};
use crate::domain::pool::{
    DEFAULT_IDLE_AUTOTERMINATION_MINUTES, DEFAULT_MIN_IDLE_INSTANCES, InstancePoolRequest,
    POOL_DEFAULT_NAME,
};
use crate::domain::resource::{InstancePoolId, PolicyId};
use crate::domain::tags::{ContextOverrides, WorkspaceContext};
use crate::error::LabforgeError;
use crate::ports::workspace::WorkspaceApi;

/// Everything `setup` provisions, in order.
#[derive(Debug, Clone)]
pub struct LabPlan {
    /// `None` skips the pool; policies are then left unbound.
    pub pool: Option<InstancePoolRequest>,
    pub archetypes: Vec<PolicyArchetype>,
    pub spark_version: Option<String>,
    pub overrides: ContextOverrides,
}

impl Default for LabPlan {
    fn default() -> Self {
        Self {
            pool: Some(InstancePoolRequest::new(POOL_DEFAULT_NAME)),
            archetypes: PolicyArchetype::ALL.to_vec(),
            spark_version: None,
            overrides: ContextOverrides::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LabReport {
    pub pool: Option<ReconcileOutcome<InstancePoolId>>,
    pub policies: Vec<(PolicyArchetype, ReconcileOutcome<PolicyId>)>,
}

pub struct ClustersProvisioner {
    reconciler: Reconciler,
}

impl ClustersProvisioner {
    pub fn new(
        api: Arc<dyn WorkspaceApi>,
        display: Arc<dyn DisplayChannel>,
        context: WorkspaceContext,
    ) -> Self {
        Self::from_reconciler(Reconciler::new(api, display, context))
    }

    pub fn from_reconciler(reconciler: Reconciler) -> Self {
        Self { reconciler }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Replaces the `DBAcademy` pool. Zero idle instances and 15 minutes of
    /// idle auto-termination unless told otherwise.
    pub async fn create_instance_pool(
        &self,
        min_idle_instances: Option<u32>,
        idle_instance_autotermination_minutes: Option<u32>,
    ) -> Result<InstancePoolId, LabforgeError> {
        let request = InstancePoolRequest::new(POOL_DEFAULT_NAME).with_sizing(
            min_idle_instances.unwrap_or(DEFAULT_MIN_IDLE_INSTANCES),
            idle_instance_autotermination_minutes.unwrap_or(DEFAULT_IDLE_AUTOTERMINATION_MINUTES),
        );
        self.create_named_instance_pool(&request).await
    }

    pub async fn create_named_instance_pool(
        &self,
        request: &InstancePoolRequest,
    ) -> Result<InstancePoolId, LabforgeError> {
        Ok(self.reconciler.replace_instance_pool(request).await?.id)
    }

    pub async fn create_all_purpose_policy(
        &self,
        instance_pool_id: Option<&InstancePoolId>,
        spark_version: &str,
    ) -> Result<PolicyId, LabforgeError> {
        let outcome = self
            .reconciler
            .upsert_cluster_policy(
                PolicyArchetype::AllPurpose.policy_name(),
                all_purpose_definition(spark_version),
                instance_pool_id,
            )
            .await?;
        Ok(outcome.id)
    }

    pub async fn create_jobs_policy(
        &self,
        instance_pool_id: Option<&InstancePoolId>,
        spark_version: &str,
    ) -> Result<PolicyId, LabforgeError> {
        let outcome = self
            .reconciler
            .upsert_cluster_policy(
                PolicyArchetype::JobsOnly.policy_name(),
                jobs_definition(spark_version),
                instance_pool_id,
            )
            .await?;
        Ok(outcome.id)
    }

    /// The DLT policy pins the environment tags as fixed custom tags, using
    /// the same source rule as pools.
    pub async fn create_dlt_policy(
        &self,
        instance_pool_id: Option<&InstancePoolId>,
        overrides: &ContextOverrides,
    ) -> Result<PolicyId, LabforgeError> {
        let tags = self.reconciler.derive_tags(overrides)?;
        let outcome = self
            .reconciler
            .upsert_cluster_policy(
                PolicyArchetype::DltOnly.policy_name(),
                dlt_definition(&tags),
                instance_pool_id,
            )
            .await?;
        Ok(outcome.id)
    }

    /// Reconciles any archetype. The spark version is required for the
    /// archetypes that pin one.
    pub async fn provision_policy(
        &self,
        archetype: PolicyArchetype,
        instance_pool_id: Option<&InstancePoolId>,
        spark_version: Option<&str>,
        overrides: &ContextOverrides,
    ) -> Result<ReconcileOutcome<PolicyId>, LabforgeError> {
        let definition = self.build_policy(archetype, spark_version, overrides)?;
        self.reconciler
            .upsert_cluster_policy(archetype.policy_name(), definition, instance_pool_id)
            .await
    }

    /// The normalized definition `provision_policy` would send, without any
    /// remote call.
    pub fn preview_policy(
        &self,
        archetype: PolicyArchetype,
        instance_pool_id: Option<&InstancePoolId>,
        spark_version: Option<&str>,
        overrides: &ContextOverrides,
    ) -> Result<PolicyDefinition, LabforgeError> {
        let definition = self.build_policy(archetype, spark_version, overrides)?;
        Reconciler::prepare_policy(definition, instance_pool_id)
    }

    // Only the DLT archetype carries environment tags, so only it needs a
    // resolved workspace context.
    fn build_policy(
        &self,
        archetype: PolicyArchetype,
        spark_version: Option<&str>,
        overrides: &ContextOverrides,
    ) -> Result<PolicyDefinition, LabforgeError> {
        let require_version = || {
            spark_version.ok_or_else(|| DomainError::MalformedDefinition {
                key: "spark_version".into(),
                reason: format!("the {} policy needs a spark version", archetype),
            })
        };

        Ok(match archetype {
            PolicyArchetype::AllPurpose => all_purpose_definition(require_version()?),
            PolicyArchetype::JobsOnly => jobs_definition(require_version()?),
            PolicyArchetype::DltOnly => dlt_definition(&self.reconciler.derive_tags(overrides)?),
        })
    }

    /// Pool first, then every requested policy bound to it. Stops at the
    /// first failure.
    #[instrument(skip(self, plan))]
    pub async fn setup(&self, plan: &LabPlan) -> Result<LabReport, LabforgeError> {
        let start = Instant::now();

        let pool = match &plan.pool {
            Some(request) => {
                let mut request = request.clone();
                if request.overrides == ContextOverrides::default() {
                    request.overrides = plan.overrides.clone();
                }
                Some(self.reconciler.replace_instance_pool(&request).await?)
            }
            None => None,
        };
        let pool_id = pool.as_ref().map(|outcome| &outcome.id);

        let mut policies = Vec::with_capacity(plan.archetypes.len());
        for archetype in &plan.archetypes {
            let outcome = self
                .provision_policy(
                    *archetype,
                    pool_id,
                    plan.spark_version.as_deref(),
                    &plan.overrides,
                )
                .await?;
            policies.push((*archetype, outcome));
        }

        info!(
            "🏁 Lab setup finished: {} pool, {} policies in {:.2?}",
            usize::from(pool.is_some()),
            policies.len(),
            start.elapsed()
        );
        Ok(LabReport { pool, policies })
    }
}
