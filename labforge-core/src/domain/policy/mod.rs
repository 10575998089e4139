// labforge-core/src/domain/policy/mod.rs

pub mod archetype;
pub mod constraint;
pub mod definition;

pub use archetype::{
    POLICY_ALL_PURPOSE, POLICY_DLT_ONLY, POLICY_JOBS_ONLY, PolicyArchetype, all_purpose_definition,
    dlt_definition, jobs_definition,
};
pub use constraint::ConstraintDescriptor;
pub use definition::{CLUSTER_PROFILE_KEY, INSTANCE_POOL_KEY, PolicyDefinition, SINGLE_NODE_PROFILE};
