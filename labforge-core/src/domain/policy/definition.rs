// labforge-core/src/domain/policy/definition.rs

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::policy::constraint::ConstraintDescriptor;
use crate::domain::resource::InstancePoolId;

pub const CLUSTER_PROFILE_KEY: &str = "spark_conf.spark.databricks.cluster.profile";
pub const INSTANCE_POOL_KEY: &str = "instance_pool_id";
pub const SINGLE_NODE_PROFILE: &str = "singleNode";

/// Ordered mapping from cluster attribute path to its constraint.
///
/// One descriptor per key: inserting an existing key replaces the descriptor
/// and keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyDefinition {
    attributes: IndexMap<String, ConstraintDescriptor>,
}

impl PolicyDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, descriptor: ConstraintDescriptor) -> Self {
        self.insert(key, descriptor);
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        descriptor: ConstraintDescriptor,
    ) -> Option<ConstraintDescriptor> {
        self.attributes.insert(key.into(), descriptor)
    }

    pub fn get(&self, key: &str) -> Option<&ConstraintDescriptor> {
        self.attributes.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConstraintDescriptor)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Checks every descriptor, stopping at the first malformed one.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (key, descriptor) in &self.attributes {
            if key.trim().is_empty() {
                return Err(DomainError::MalformedDefinition {
                    key: key.clone(),
                    reason: "attribute key is empty".into(),
                });
            }
            descriptor.validate(key)?;
        }
        Ok(())
    }

    /// Pins clusters to `pool`. `None` leaves the definition untouched.
    pub fn bind_instance_pool(&mut self, pool: Option<&InstancePoolId>) {
        if let Some(id) = pool {
            self.insert(INSTANCE_POOL_KEY, ConstraintDescriptor::fixed(id.as_str()));
        }
    }

    /// Forces an existing cluster profile constraint to a visible fixed
    /// `singleNode`, whatever the definition declared before.
    pub fn normalize_cluster_profile(&mut self) {
        if let Some(slot) = self.attributes.get_mut(CLUSTER_PROFILE_KEY) {
            *slot = ConstraintDescriptor::fixed(SINGLE_NODE_PROFILE);
        }
    }

    /// The policy API takes the definition as a JSON document inside a string.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.attributes)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.attributes)
    }
}
