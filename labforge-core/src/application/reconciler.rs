// labforge-core/src/application/reconciler.rs

// Makes one named slot match its definition. Pools are replaced (delete then
// create) because some pool attributes cannot change after creation; policies
// are created or updated by name. Remote calls run strictly one after the
// other: delete -> create -> grant -> display.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::application::ports::{DisplayChannel, LinkRenderer};
use crate::domain::lifecycle::{SlotEvent, SlotState, SlotTrace};
use crate::domain::permission::{PermissionLevel, USERS_GROUP};
use crate::domain::policy::PolicyDefinition;
use crate::domain::pool::{InstancePoolRequest, InstancePoolSpec};
use crate::domain::ports::Sanitizer;
use crate::domain::resource::{InstancePoolId, PolicyId, ResourceKind, ResourceRef, UpsertAction};
use crate::domain::sanitize::CleanStringSanitizer;
use crate::domain::tags::{ContextOverrides, TagNamespace, TagSet, WorkspaceContext};
use crate::error::LabforgeError;
use crate::infrastructure::display::HtmlLinkRenderer;
use crate::ports::workspace::WorkspaceApi;

/// Result of reconciling one slot.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome<Id> {
    pub id: Id,
    pub name: String,
    /// Pools: a same-named pool was deleted first. Policies: updated in place.
    pub replaced: bool,
    pub trace: SlotTrace,
    pub completed_at: DateTime<Utc>,
}

pub struct Reconciler {
    api: Arc<dyn WorkspaceApi>,
    display: Arc<dyn DisplayChannel>,
    renderer: Arc<dyn LinkRenderer>,
    sanitizer: Arc<dyn Sanitizer>,
    context: WorkspaceContext,
}

impl Reconciler {
    pub fn new(
        api: Arc<dyn WorkspaceApi>,
        display: Arc<dyn DisplayChannel>,
        context: WorkspaceContext,
    ) -> Self {
        Self {
            api,
            display,
            renderer: Arc::new(HtmlLinkRenderer::new()),
            sanitizer: Arc::new(CleanStringSanitizer::new()),
            context,
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn LinkRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn context(&self) -> &WorkspaceContext {
        &self.context
    }

    /// Sanitized environment tags for one call: overrides first, then the
    /// injected context.
    pub fn derive_tags(&self, overrides: &ContextOverrides) -> Result<TagSet, LabforgeError> {
        let context = overrides.resolve(&self.context)?;
        Ok(TagSet::derive(&context, self.sanitizer.as_ref()))
    }

    /// Two-phase replace of the pool slot `request.name`: whatever pool holds
    /// the name is destroyed, then a fresh one is created, shared with
    /// `users` and announced on the display channel.
    #[instrument(skip(self, request), fields(pool = %request.name))]
    pub async fn replace_instance_pool(
        &self,
        request: &InstancePoolRequest,
    ) -> Result<ReconcileOutcome<InstancePoolId>, LabforgeError> {
        let start = Instant::now();

        // 1-2. Context and tags, before touching the remote side
        let tags = self.derive_tags(&request.overrides)?;
        let spec = InstancePoolSpec::from_request(request, tags.tags(TagNamespace::Pool));

        let mut trace = SlotTrace::new(&spec.name, SlotState::Live);

        // 3. Delete by name
        trace.apply(SlotEvent::BeginDelete)?;
        let replaced = match self.api.delete_instance_pool_by_name(&spec.name).await {
            Ok(deleted) => {
                trace.apply(SlotEvent::Deleted)?;
                if deleted {
                    info!("🗑️  Previous pool '{}' deleted", spec.name);
                } else {
                    debug!("No pool named '{}' to delete", spec.name);
                }
                deleted
            }
            Err(e) => {
                trace.apply(SlotEvent::Failed)?;
                error!(path = %trace.path(), "❌ Delete of pool '{}' failed after {:.2?}: {}", spec.name, start.elapsed(), e);
                return Err(LabforgeError::slot_failed(trace, e));
            }
        };

        // 4. Create
        trace.apply(SlotEvent::BeginCreate)?;
        let created = match self.api.create_or_update_instance_pool(&spec).await {
            Ok(created) => {
                trace.apply(SlotEvent::Created)?;
                created
            }
            Err(e) => {
                trace.apply(SlotEvent::Failed)?;
                error!(path = %trace.path(), "❌ Create of pool '{}' failed after {:.2?}: {}", spec.name, start.elapsed(), e);
                return Err(LabforgeError::slot_failed(trace, e));
            }
        };
        if created.action == UpsertAction::Updated {
            // Someone else recreated the name between our delete and create
            warn!("⚠️  Pool '{}' reappeared during reconcile; it was edited, not recreated", spec.name);
        }
        let pool_id = created.id;
        info!(pool_id = %pool_id, "✅ Pool '{}' created", spec.name);

        // 5. Share with users
        self.api
            .update_pool_group_permission(&pool_id, USERS_GROUP, PermissionLevel::CanAttachTo)
            .await?;

        // 6. Tell a human
        self.present(&ResourceRef::new(ResourceKind::InstancePool, &spec.name, pool_id.as_str()));

        debug!(path = %trace.path(), "Pool slot reconciled in {:.2?}", start.elapsed());
        Ok(ReconcileOutcome {
            id: pool_id,
            name: spec.name,
            replaced,
            trace,
            completed_at: Utc::now(),
        })
    }

    /// Creates or updates the policy `name` from `definition`, optionally
    /// pinned to `instance_pool_id`, and grants `users` the right to use it.
    #[instrument(skip(self, definition, instance_pool_id))]
    pub async fn upsert_cluster_policy(
        &self,
        name: &str,
        definition: PolicyDefinition,
        instance_pool_id: Option<&InstancePoolId>,
    ) -> Result<ReconcileOutcome<PolicyId>, LabforgeError> {
        let start = Instant::now();

        let definition = Self::prepare_policy(definition, instance_pool_id)?;

        let upserted = match self.api.create_or_update_cluster_policy(name, &definition).await {
            Ok(upserted) => upserted,
            Err(e) => {
                let mut trace = SlotTrace::new(name, SlotState::Absent);
                trace.apply(SlotEvent::BeginCreate)?;
                trace.apply(SlotEvent::Failed)?;
                error!(path = %trace.path(), "❌ Policy '{}' failed after {:.2?}: {}", name, start.elapsed(), e);
                return Err(LabforgeError::slot_failed(trace, e));
            }
        };

        let trace = match upserted.action {
            UpsertAction::Created => {
                let mut trace = SlotTrace::new(name, SlotState::Absent);
                trace.apply(SlotEvent::BeginCreate)?;
                trace.apply(SlotEvent::Created)?;
                trace
            }
            UpsertAction::Updated => {
                let mut trace = SlotTrace::new(name, SlotState::Live);
                trace.apply(SlotEvent::Updated)?;
                trace
            }
        };
        let verb = match upserted.action {
            UpsertAction::Created => "created",
            UpsertAction::Updated => "updated",
        };
        let policy_id = upserted.id;
        info!(policy_id = %policy_id, "✅ Policy '{}' {}", name, verb);

        self.api
            .update_policy_group_permission(&policy_id, USERS_GROUP, PermissionLevel::CanUse)
            .await?;

        self.present(&ResourceRef::new(ResourceKind::ClusterPolicy, name, policy_id.as_str()));

        debug!(path = %trace.path(), "Policy slot reconciled in {:.2?}", start.elapsed());
        Ok(ReconcileOutcome {
            id: policy_id,
            name: name.to_string(),
            replaced: upserted.action == UpsertAction::Updated,
            trace,
            completed_at: Utc::now(),
        })
    }

    /// The definition exactly as it will be sent: pool binding injected,
    /// cluster profile forced to single node, constraints checked.
    pub fn prepare_policy(
        mut definition: PolicyDefinition,
        instance_pool_id: Option<&InstancePoolId>,
    ) -> Result<PolicyDefinition, LabforgeError> {
        definition.bind_instance_pool(instance_pool_id);
        definition.normalize_cluster_profile();
        definition.validate()?;
        Ok(definition)
    }

    // Display is informational: a rendering failure is logged, never raised.
    fn present(&self, reference: &ResourceRef) {
        match self.renderer.render_link(reference) {
            Ok(html) => self.display.show_html(&html),
            Err(e) => warn!("Could not render link for '{}': {}", reference.name, e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::policy::{
        CLUSTER_PROFILE_KEY, ConstraintDescriptor, INSTANCE_POOL_KEY, all_purpose_definition,
    };
    use crate::domain::resource::Upserted;
    use crate::infrastructure::adapters::InMemoryWorkspace;
    use crate::infrastructure::display::RecordingDisplay;
    use crate::infrastructure::error::InfrastructureError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // --- MOCK WORKSPACE ---
    // Records every call in order; can be told to fail one operation.
    #[derive(Default)]
    struct MockWorkspace {
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl MockWorkspace {
        fn failing(op: &'static str) -> Self {
            Self {
                fail_on: Some(op),
                ..Default::default()
            }
        }

        fn record(&self, op: &str, detail: String) -> Result<(), LabforgeError> {
            self.calls.lock().unwrap().push(format!("{}:{}", op, detail));
            if self.fail_on == Some(op) {
                return Err(InfrastructureError::Api {
                    status: 500,
                    error_code: "INTERNAL_ERROR".into(),
                    message: format!("{} exploded", op),
                }
                .into());
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WorkspaceApi for MockWorkspace {
        async fn delete_instance_pool_by_name(&self, name: &str) -> Result<bool, LabforgeError> {
            self.record("delete", name.to_string())?;
            Ok(false)
        }

        async fn create_or_update_instance_pool(
            &self,
            spec: &InstancePoolSpec,
        ) -> Result<Upserted<InstancePoolId>, LabforgeError> {
            self.record("create_pool", spec.name.clone())?;
            Ok(Upserted::created(InstancePoolId::new("pool-1")))
        }

        async fn create_or_update_cluster_policy(
            &self,
            name: &str,
            _definition: &PolicyDefinition,
        ) -> Result<Upserted<PolicyId>, LabforgeError> {
            self.record("create_policy", name.to_string())?;
            Ok(Upserted::created(PolicyId::new("policy-1")))
        }

        async fn update_pool_group_permission(
            &self,
            pool_id: &InstancePoolId,
            group: &str,
            level: PermissionLevel,
        ) -> Result<(), LabforgeError> {
            self.record("grant_pool", format!("{}/{}/{}", pool_id, group, level))
        }

        async fn update_policy_group_permission(
            &self,
            policy_id: &PolicyId,
            group: &str,
            level: PermissionLevel,
        ) -> Result<(), LabforgeError> {
            self.record("grant_policy", format!("{}/{}/{}", policy_id, group, level))
        }
    }

    fn context(smoke_test: bool) -> WorkspaceContext {
        WorkspaceContext {
            lab_id: "Lab 9".into(),
            description: "ML in Production".into(),
            workspace_name: "ws-9".into(),
            org_id: "555".into(),
            smoke_test,
        }
    }

    fn reconciler(api: Arc<dyn WorkspaceApi>, display: Arc<RecordingDisplay>) -> Reconciler {
        Reconciler::new(api, display, context(false))
    }

    #[tokio::test]
    async fn test_pool_calls_are_ordered() -> anyhow::Result<()> {
        let api = Arc::new(MockWorkspace::default());
        let display = Arc::new(RecordingDisplay::new());
        let r = reconciler(api.clone(), display.clone());

        let outcome = r
            .replace_instance_pool(&InstancePoolRequest::new("DBAcademy").with_sizing(2, 15))
            .await?;

        assert_eq!(outcome.id, InstancePoolId::new("pool-1"));
        assert!(!outcome.replaced);
        assert_eq!(
            api.calls(),
            vec![
                "delete:DBAcademy",
                "create_pool:DBAcademy",
                "grant_pool:pool-1/users/CAN_ATTACH_TO"
            ]
        );
        assert_eq!(
            outcome.trace.path(),
            "LIVE -> DELETING -> ABSENT -> CREATING -> LIVE"
        );

        let shown = display.shown();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].contains("DBAcademy (pool-1)"));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_failure_stops_before_create() {
        let api = Arc::new(MockWorkspace::failing("delete"));
        let display = Arc::new(RecordingDisplay::new());
        let r = reconciler(api.clone(), display.clone());

        let err = r
            .replace_instance_pool(&InstancePoolRequest::new("DBAcademy"))
            .await
            .unwrap_err();

        let trace = err.trace().unwrap();
        assert_eq!(trace.slot(), "DBAcademy");
        assert_eq!(trace.current(), SlotState::Error);
        assert_eq!(trace.path(), "LIVE -> DELETING -> ERROR");
        assert_eq!(api.calls(), vec!["delete:DBAcademy"]);
        assert!(display.shown().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_propagates_remote_message() {
        let api = Arc::new(MockWorkspace::failing("create_pool"));
        let r = reconciler(api.clone(), Arc::new(RecordingDisplay::new()));

        let err = r
            .replace_instance_pool(&InstancePoolRequest::new("DBAcademy"))
            .await
            .unwrap_err();

        assert!(err.is_remote());
        assert!(format!("{:?}", err).contains("create_pool exploded"));
        assert_eq!(
            err.trace().map(SlotTrace::path).as_deref(),
            Some("LIVE -> DELETING -> ABSENT -> CREATING -> ERROR")
        );
        // No grant after a failed create
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_grant_failure_leaves_pool_behind() {
        let api = Arc::new(MockWorkspace::failing("grant_pool"));
        let display = Arc::new(RecordingDisplay::new());
        let r = reconciler(api.clone(), display.clone());

        let result = r.replace_instance_pool(&InstancePoolRequest::new("DBAcademy")).await;

        // No rollback: the pool exists, only the permission is missing
        assert!(result.as_ref().is_err_and(|e| e.trace().is_none()));
        assert_eq!(api.calls()[1], "create_pool:DBAcademy");
        assert!(display.shown().is_empty());
    }

    #[tokio::test]
    async fn test_missing_context_fails_before_any_call() {
        let api = Arc::new(MockWorkspace::default());
        let mut ctx = context(false);
        ctx.lab_id.clear();
        let r = Reconciler::new(api.clone(), Arc::new(RecordingDisplay::new()), ctx);

        let result = r.replace_instance_pool(&InstancePoolRequest::new("DBAcademy")).await;
        assert!(matches!(
            result,
            Err(LabforgeError::Domain(DomainError::MissingContext(_)))
        ));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_twice_leaves_exactly_one_pool_with_fresh_id() -> anyhow::Result<()> {
        let ws = Arc::new(InMemoryWorkspace::new());
        let r = reconciler(ws.clone(), Arc::new(RecordingDisplay::new()));
        let request = InstancePoolRequest::new("DBAcademy").with_sizing(2, 15);

        let first = r.replace_instance_pool(&request).await?;
        assert_eq!(ws.pools_named("DBAcademy").len(), 1);

        let second = r.replace_instance_pool(&request).await?;
        let pools = ws.pools_named("DBAcademy");

        assert_eq!(pools.len(), 1);
        assert_ne!(first.id, second.id);
        assert!(second.replaced);
        assert_eq!(pools[0].id, second.id);
        assert_eq!(pools[0].spec.min_idle_instances, 2);
        assert_eq!(ws.grants_for(second.id.as_str()).len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_pool_tags_use_source_rule() -> anyhow::Result<()> {
        let ws = Arc::new(InMemoryWorkspace::new());

        let r = Reconciler::new(ws.clone(), Arc::new(RecordingDisplay::new()), context(false));
        r.replace_instance_pool(&InstancePoolRequest::new("lab")).await?;
        let spec = ws.pools_named("lab")[0].spec.clone();
        assert_eq!(spec.tag("dbacademy.source"), Some("Lab_9"));
        assert_eq!(spec.tag("dbacademy.lab_id"), Some("Lab_9"));
        assert_eq!(spec.tag("dbacademy.description"), Some("ML_in_Production"));

        let r = Reconciler::new(ws.clone(), Arc::new(RecordingDisplay::new()), context(true));
        r.replace_instance_pool(&InstancePoolRequest::new("smoke")).await?;
        let spec = ws.pools_named("smoke")[0].spec.clone();
        assert_eq!(spec.tag("dbacademy.source"), Some("Smoke-Test"));
        Ok(())
    }

    #[tokio::test]
    async fn test_injected_sanitizer_shapes_every_tag() -> anyhow::Result<()> {
        let ws = Arc::new(InMemoryWorkspace::new());
        let upper = |raw: &str| raw.to_uppercase().replace(' ', "-");
        let r = reconciler(ws.clone(), Arc::new(RecordingDisplay::new()))
            .with_sanitizer(Arc::new(upper));

        r.replace_instance_pool(&InstancePoolRequest::new("DBAcademy")).await?;

        let spec = ws.pools_named("DBAcademy")[0].spec.clone();
        assert_eq!(spec.tag("dbacademy.lab_id"), Some("LAB-9"));
        assert_eq!(spec.tag("dbacademy.source"), Some("LAB-9"));
        assert_eq!(spec.tag("dbacademy.workspace"), Some("WS-9"));
        Ok(())
    }

    struct BrokenRenderer;

    impl LinkRenderer for BrokenRenderer {
        fn render_link(&self, _reference: &ResourceRef) -> Result<String, LabforgeError> {
            Err(LabforgeError::InternalError("template missing".into()))
        }
    }

    #[tokio::test]
    async fn test_render_failure_does_not_fail_reconcile() -> anyhow::Result<()> {
        let ws = Arc::new(InMemoryWorkspace::new());
        let display = Arc::new(RecordingDisplay::new());
        let r = reconciler(ws.clone(), display.clone()).with_renderer(Arc::new(BrokenRenderer));

        let outcome = r
            .upsert_cluster_policy("DBAcademy", all_purpose_definition("13.3.x"), None)
            .await?;

        assert_eq!(ws.grants_for(outcome.id.as_str()).len(), 1);
        assert!(display.shown().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_pool_overrides_take_precedence() -> anyhow::Result<()> {
        let ws = Arc::new(InMemoryWorkspace::new());
        let r = reconciler(ws.clone(), Arc::new(RecordingDisplay::new()));
        let request = InstancePoolRequest::new("DBAcademy").with_overrides(ContextOverrides {
            org_id: Some("override-org".into()),
            ..Default::default()
        });

        r.replace_instance_pool(&request).await?;
        let spec = ws.pools_named("DBAcademy")[0].spec.clone();
        assert_eq!(spec.tag("dbacademy.org_id"), Some("override-org"));
        assert_eq!(spec.tag("dbacademy.workspace"), Some("ws-9"));
        Ok(())
    }

    #[tokio::test]
    async fn test_policy_calls_are_ordered() -> anyhow::Result<()> {
        let api = Arc::new(MockWorkspace::default());
        let display = Arc::new(RecordingDisplay::new());
        let r = reconciler(api.clone(), display.clone());

        let outcome = r
            .upsert_cluster_policy("DBAcademy Jobs", all_purpose_definition("13.3.x"), None)
            .await?;

        assert_eq!(outcome.id, PolicyId::new("policy-1"));
        assert_eq!(
            api.calls(),
            vec![
                "create_policy:DBAcademy Jobs",
                "grant_policy:policy-1/users/CAN_USE"
            ]
        );
        assert!(display.shown()[0].contains("DBAcademy Jobs (policy-1)"));
        Ok(())
    }

    #[tokio::test]
    async fn test_policy_binds_pool_and_forces_single_node() -> anyhow::Result<()> {
        let ws = Arc::new(InMemoryWorkspace::new());
        let r = reconciler(ws.clone(), Arc::new(RecordingDisplay::new()));

        let custom = PolicyDefinition::new()
            .with("cluster_type", ConstraintDescriptor::fixed("all-purpose"))
            .with(CLUSTER_PROFILE_KEY, ConstraintDescriptor::unlimited().with_hidden(true));
        let pool = InstancePoolId::new("pool-1");

        r.upsert_cluster_policy("Custom", custom, Some(&pool)).await?;

        let stored = ws.policies_named("Custom")[0].definition.clone();
        assert_eq!(stored.get(INSTANCE_POOL_KEY), Some(&ConstraintDescriptor::fixed("pool-1")));
        assert_eq!(
            stored.get(CLUSTER_PROFILE_KEY),
            Some(&ConstraintDescriptor::fixed("singleNode"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_policy_without_pool_has_no_binding() -> anyhow::Result<()> {
        let ws = Arc::new(InMemoryWorkspace::new());
        let r = reconciler(ws.clone(), Arc::new(RecordingDisplay::new()));

        r.upsert_cluster_policy("DBAcademy", all_purpose_definition("13.3.x"), None)
            .await?;
        let stored = ws.policies_named("DBAcademy")[0].definition.clone();
        assert!(!stored.contains_key(INSTANCE_POOL_KEY));
        Ok(())
    }

    #[tokio::test]
    async fn test_policy_updates_in_place() -> anyhow::Result<()> {
        let ws = Arc::new(InMemoryWorkspace::new());
        let r = reconciler(ws.clone(), Arc::new(RecordingDisplay::new()));

        let first = r
            .upsert_cluster_policy("DBAcademy", all_purpose_definition("13.3.x"), None)
            .await?;
        let second = r
            .upsert_cluster_policy("DBAcademy", all_purpose_definition("14.3.x"), None)
            .await?;

        assert_eq!(first.id, second.id);
        assert!(second.replaced);
        assert_eq!(second.trace.path(), "LIVE -> LIVE");
        assert_eq!(ws.policy_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_definition_never_reaches_remote() {
        let api = Arc::new(MockWorkspace::default());
        let r = reconciler(api.clone(), Arc::new(RecordingDisplay::new()));

        let broken = PolicyDefinition::new()
            .with("autotermination_minutes", ConstraintDescriptor::range(180, 1));
        let result = r.upsert_cluster_policy("Broken", broken, None).await;

        assert!(matches!(
            result,
            Err(LabforgeError::Domain(DomainError::MalformedDefinition { .. }))
        ));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_policy_create_failure_propagates() {
        let api = Arc::new(MockWorkspace::failing("create_policy"));
        let display = Arc::new(RecordingDisplay::new());
        let r = reconciler(api.clone(), display.clone());

        let result = r
            .upsert_cluster_policy("DBAcademy", all_purpose_definition("13.3.x"), None)
            .await;

        let err = result.unwrap_err();
        assert!(err.is_remote());
        assert_eq!(
            err.trace().map(SlotTrace::path).as_deref(),
            Some("ABSENT -> CREATING -> ERROR")
        );
        assert!(err.to_string().contains("DBAcademy"));
        assert_eq!(api.calls(), vec!["create_policy:DBAcademy"]);
        assert!(display.shown().is_empty());
    }
}
