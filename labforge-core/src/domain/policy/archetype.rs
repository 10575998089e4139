// labforge-core/src/domain/policy/archetype.rs

// Pure builders for the three policy archetypes. No remote calls, no
// sanitizing: tags arrive already cleaned from the reconciler.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;
use crate::domain::policy::constraint::ConstraintDescriptor;
use crate::domain::policy::definition::{CLUSTER_PROFILE_KEY, PolicyDefinition, SINGLE_NODE_PROFILE};
use crate::domain::tags::{TagNamespace, TagSet};

pub const POLICY_ALL_PURPOSE: &str = "DBAcademy";
pub const POLICY_JOBS_ONLY: &str = "DBAcademy Jobs";
pub const POLICY_DLT_ONLY: &str = "DBAcademy DLT";

const DATA_SECURITY_MODE: &str = "SINGLE_USER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyArchetype {
    AllPurpose,
    #[serde(rename = "jobs")]
    JobsOnly,
    #[serde(rename = "dlt")]
    DltOnly,
}

impl PolicyArchetype {
    pub const ALL: [PolicyArchetype; 3] = [Self::AllPurpose, Self::JobsOnly, Self::DltOnly];

    /// Name of the policy slot this archetype provisions.
    pub fn policy_name(&self) -> &'static str {
        match self {
            Self::AllPurpose => POLICY_ALL_PURPOSE,
            Self::JobsOnly => POLICY_JOBS_ONLY,
            Self::DltOnly => POLICY_DLT_ONLY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllPurpose => "all-purpose",
            Self::JobsOnly => "jobs",
            Self::DltOnly => "dlt",
        }
    }
}

impl fmt::Display for PolicyArchetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PolicyArchetype {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all-purpose" | "all_purpose" => Ok(Self::AllPurpose),
            "jobs" | "job" | "jobs-only" => Ok(Self::JobsOnly),
            "dlt" | "dlt-only" => Ok(Self::DltOnly),
            _ => Err(DomainError::UnknownArchetype(s.to_string())),
        }
    }
}

fn single_node_profile() -> ConstraintDescriptor {
    ConstraintDescriptor::fixed(SINGLE_NODE_PROFILE)
}

fn spark_version_default(spark_version: &str) -> ConstraintDescriptor {
    ConstraintDescriptor::unlimited()
        .with_default(spark_version)
        .optional()
}

/// Interactive single-node clusters with bounded auto-termination.
pub fn all_purpose_definition(spark_version: &str) -> PolicyDefinition {
    PolicyDefinition::new()
        .with("cluster_type", ConstraintDescriptor::fixed("all-purpose"))
        .with(
            "autotermination_minutes",
            ConstraintDescriptor::range(1, 180).with_default(120),
        )
        .with(CLUSTER_PROFILE_KEY, single_node_profile())
        .with("num_workers", ConstraintDescriptor::fixed(0))
        .with("spark_version", spark_version_default(spark_version))
        .with(
            "data_security_mode",
            ConstraintDescriptor::unlimited().with_default(DATA_SECURITY_MODE),
        )
}

/// Single-node job clusters.
pub fn jobs_definition(spark_version: &str) -> PolicyDefinition {
    PolicyDefinition::new()
        .with("cluster_type", ConstraintDescriptor::fixed("job"))
        .with("spark_version", spark_version_default(spark_version))
        .with(CLUSTER_PROFILE_KEY, single_node_profile())
        .with("num_workers", ConstraintDescriptor::fixed(0))
        .with(
            "data_security_mode",
            ConstraintDescriptor::unlimited().with_default(DATA_SECURITY_MODE),
        )
}

/// Single-node DLT clusters, with the environment tags pinned as custom tags.
pub fn dlt_definition(tags: &TagSet) -> PolicyDefinition {
    let mut definition = PolicyDefinition::new()
        .with("cluster_type", ConstraintDescriptor::fixed("dlt"))
        .with(CLUSTER_PROFILE_KEY, single_node_profile())
        .with("num_workers", ConstraintDescriptor::fixed(0));

    for tag in tags.tags(TagNamespace::ClusterCustomTags) {
        definition.insert(tag.key, ConstraintDescriptor::fixed(tag.value));
    }
    definition
}
