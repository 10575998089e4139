// labforge-core/src/infrastructure/config/settings.rs

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::domain::policy::PolicyArchetype;
use crate::domain::pool::{
    DEFAULT_IDLE_AUTOTERMINATION_MINUTES, DEFAULT_MIN_IDLE_INSTANCES, InstancePoolRequest,
    POOL_DEFAULT_NAME,
};
use crate::domain::tags::WorkspaceContext;
use crate::infrastructure::error::InfrastructureError;

/// Contents of `labforge.yaml`.
#[derive(Debug, Deserialize, Serialize, Clone, Default, Validate)]
pub struct LabforgeConfig {
    #[serde(default)]
    #[validate(nested)]
    pub workspace: WorkspaceSettings,

    #[serde(default)]
    #[validate(nested)]
    pub connection: ConnectionSettings,

    #[serde(default)]
    #[validate(nested)]
    pub pool: PoolSettings,

    #[serde(default)]
    pub policies: PolicySettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, Validate)]
pub struct WorkspaceSettings {
    pub lab_id: Option<String>,
    pub description: Option<String>,
    pub workspace_name: Option<String>,
    pub org_id: Option<String>,
    #[serde(default)]
    pub smoke_test: bool,
}

impl WorkspaceSettings {
    /// Unset values become empty strings; the reconciler rejects those when it
    /// resolves the context for a call.
    pub fn context(&self) -> WorkspaceContext {
        WorkspaceContext {
            lab_id: self.lab_id.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            workspace_name: self.workspace_name.clone().unwrap_or_default(),
            org_id: self.org_id.clone().unwrap_or_default(),
            smoke_test: self.smoke_test,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct ConnectionSettings {
    #[validate(length(min = 1, message = "host cannot be empty"))]
    pub host: Option<String>,

    #[serde(default = "default_token_env")]
    #[validate(length(min = 1))]
    pub token_env: String,

    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 600))]
    pub timeout_secs: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: None,
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ConnectionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn require_host(&self) -> Result<&str, InfrastructureError> {
        self.host.as_deref().ok_or_else(|| {
            InfrastructureError::ConfigError(
                "connection.host is not set (labforge.yaml or DATABRICKS_HOST)".into(),
            )
        })
    }

    /// Reads the API token from the variable named by `token_env`.
    pub fn token_from<F>(&self, lookup: F) -> Result<String, InfrastructureError>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(&self.token_env)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| InfrastructureError::MissingCredentials(self.token_env.clone()))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct PoolSettings {
    #[serde(default = "default_pool_name")]
    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default = "default_min_idle")]
    pub min_idle_instances: u32,

    #[serde(default = "default_autotermination")]
    #[validate(range(max = 10000))]
    pub idle_instance_autotermination_minutes: u32,

    pub node_type_id: Option<String>,

    #[serde(default)]
    pub preloaded_spark_versions: Vec<String>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            name: default_pool_name(),
            min_idle_instances: default_min_idle(),
            idle_instance_autotermination_minutes: default_autotermination(),
            node_type_id: None,
            preloaded_spark_versions: Vec::new(),
        }
    }
}

impl PoolSettings {
    /// Layers command-line values over the file and re-checks the result.
    pub fn merged(
        &self,
        name: Option<String>,
        min_idle_instances: Option<u32>,
        idle_instance_autotermination_minutes: Option<u32>,
    ) -> Result<PoolSettings, InfrastructureError> {
        let mut merged = self.clone();
        if let Some(name) = name {
            merged.name = name;
        }
        if let Some(min_idle) = min_idle_instances {
            merged.min_idle_instances = min_idle;
        }
        if let Some(minutes) = idle_instance_autotermination_minutes {
            merged.idle_instance_autotermination_minutes = minutes;
        }
        merged.validate()?;
        Ok(merged)
    }

    pub fn request(&self) -> InstancePoolRequest {
        InstancePoolRequest::new(self.name.clone())
            .with_sizing(self.min_idle_instances, self.idle_instance_autotermination_minutes)
            .with_node_type(self.node_type_id.clone())
            .with_preloaded_spark_versions(self.preloaded_spark_versions.clone())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PolicySettings {
    pub spark_version: Option<String>,

    #[serde(default = "default_archetypes")]
    pub archetypes: Vec<PolicyArchetype>,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            spark_version: None,
            archetypes: default_archetypes(),
        }
    }
}

fn default_token_env() -> String {
    "DATABRICKS_TOKEN".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_pool_name() -> String {
    POOL_DEFAULT_NAME.to_string()
}
fn default_min_idle() -> u32 {
    DEFAULT_MIN_IDLE_INSTANCES
}
fn default_autotermination() -> u32 {
    DEFAULT_IDLE_AUTOTERMINATION_MINUTES
}
fn default_archetypes() -> Vec<PolicyArchetype> {
    PolicyArchetype::ALL.to_vec()
}
