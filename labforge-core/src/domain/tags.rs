// labforge-core/src/domain/tags.rs

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::ports::Sanitizer;

/// Value of the `source` tag for resources created by smoke-test runs.
pub const SMOKE_TEST_SOURCE: &str = "Smoke-Test";

/// Environment the resources are provisioned for.
///
/// Built once by the configuration layer and injected into the reconciler,
/// never looked up from process-wide state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceContext {
    pub lab_id: String,
    pub description: String,
    pub workspace_name: String,
    pub org_id: String,
    #[serde(default)]
    pub smoke_test: bool,
}

/// Per-call values that take precedence over the injected [`WorkspaceContext`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOverrides {
    pub lab_id: Option<String>,
    pub description: Option<String>,
    pub workspace_name: Option<String>,
    pub org_id: Option<String>,
}

impl ContextOverrides {
    /// Merges the overrides over `base`. Empty strings count as unset, and the
    /// result must carry a value for every field.
    pub fn resolve(&self, base: &WorkspaceContext) -> Result<WorkspaceContext, DomainError> {
        fn pick(over: &Option<String>, fallback: &str, field: &str) -> Result<String, DomainError> {
            let value = over
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(fallback);
            if value.trim().is_empty() {
                return Err(DomainError::MissingContext(field.to_string()));
            }
            Ok(value.to_string())
        }

        Ok(WorkspaceContext {
            lab_id: pick(&self.lab_id, &base.lab_id, "lab_id")?,
            description: pick(&self.description, &base.description, "description")?,
            workspace_name: pick(&self.workspace_name, &base.workspace_name, "workspace_name")?,
            org_id: pick(&self.org_id, &base.org_id, "org_id")?,
            smoke_test: base.smoke_test,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Where a tag key lives: directly on a pool, or as a custom tag pinned by a
/// cluster policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagNamespace {
    Pool,
    ClusterCustomTags,
}

impl TagNamespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Pool => "dbacademy",
            Self::ClusterCustomTags => "custom_tags.dbacademy",
        }
    }

    pub fn key(&self, field: &str) -> String {
        format!("{}.{}", self.prefix(), field)
    }
}

/// The five sanitized environment tags attached to every provisioned resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSet {
    pub lab_id: String,
    pub description: String,
    pub workspace: String,
    pub org_id: String,
    pub source: String,
}

impl TagSet {
    pub const FIELDS: [&'static str; 5] = ["lab_id", "description", "workspace", "org_id", "source"];

    /// Single home of the `source` rule: smoke-test runs are tagged
    /// `Smoke-Test`, everything else carries the lab id.
    pub fn derive(context: &WorkspaceContext, sanitizer: &dyn Sanitizer) -> Self {
        let lab_id = sanitizer.clean(&context.lab_id);
        let source = if context.smoke_test {
            sanitizer.clean(SMOKE_TEST_SOURCE)
        } else {
            sanitizer.clean(&lab_id)
        };

        Self {
            lab_id,
            description: sanitizer.clean(&context.description),
            workspace: sanitizer.clean(&context.workspace_name),
            org_id: sanitizer.clean(&context.org_id),
            source,
        }
    }

    pub fn tags(&self, namespace: TagNamespace) -> Vec<Tag> {
        let values = [
            &self.lab_id,
            &self.description,
            &self.workspace,
            &self.org_id,
            &self.source,
        ];
        Self::FIELDS
            .iter()
            .zip(values)
            .map(|(field, value)| Tag::new(namespace.key(field), value.clone()))
            .collect()
    }
}
