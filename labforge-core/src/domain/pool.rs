// labforge-core/src/domain/pool.rs

use serde::Serialize;

use crate::domain::tags::{ContextOverrides, Tag};

pub const POOL_DEFAULT_NAME: &str = "DBAcademy";

pub const DEFAULT_MIN_IDLE_INSTANCES: u32 = 0;
pub const DEFAULT_IDLE_AUTOTERMINATION_MINUTES: u32 = 15;

/// What a caller asks for when provisioning a pool.
#[derive(Debug, Clone)]
pub struct InstancePoolRequest {
    pub name: String,
    pub min_idle_instances: u32,
    pub idle_instance_autotermination_minutes: u32,
    pub node_type_id: Option<String>,
    pub preloaded_spark_versions: Vec<String>,
    pub overrides: ContextOverrides,
}

impl InstancePoolRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_idle_instances: DEFAULT_MIN_IDLE_INSTANCES,
            idle_instance_autotermination_minutes: DEFAULT_IDLE_AUTOTERMINATION_MINUTES,
            node_type_id: None,
            preloaded_spark_versions: Vec::new(),
            overrides: ContextOverrides::default(),
        }
    }

    pub fn with_sizing(mut self, min_idle_instances: u32, idle_autotermination_minutes: u32) -> Self {
        self.min_idle_instances = min_idle_instances;
        self.idle_instance_autotermination_minutes = idle_autotermination_minutes;
        self
    }

    pub fn with_node_type(mut self, node_type_id: Option<String>) -> Self {
        self.node_type_id = node_type_id;
        self
    }

    pub fn with_preloaded_spark_versions(mut self, versions: Vec<String>) -> Self {
        self.preloaded_spark_versions = versions;
        self
    }

    pub fn with_overrides(mut self, overrides: ContextOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Fully resolved pool, as sent to the remote system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstancePoolSpec {
    pub name: String,
    pub min_idle_instances: u32,
    pub idle_instance_autotermination_minutes: u32,
    pub node_type_id: Option<String>,
    pub preloaded_spark_versions: Vec<String>,
    pub tags: Vec<Tag>,
}

impl InstancePoolSpec {
    pub fn from_request(request: &InstancePoolRequest, tags: Vec<Tag>) -> Self {
        Self {
            name: request.name.clone(),
            min_idle_instances: request.min_idle_instances,
            idle_instance_autotermination_minutes: request.idle_instance_autotermination_minutes,
            node_type_id: request.node_type_id.clone(),
            preloaded_spark_versions: request.preloaded_spark_versions.clone(),
            tags,
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }
}
