// labforge-core/src/domain/resource.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of slot this crate reconciles. Names are scoped per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    InstancePool,
    ClusterPolicy,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstancePool => "instance_pool",
            Self::ClusterPolicy => "cluster_policy",
        }
    }

    /// Fragment of the workspace UI route that shows a resource of this kind.
    pub fn view_route(&self) -> &'static str {
        match self {
            Self::InstancePool => "/#setting/clusters/instance-pools/view",
            Self::ClusterPolicy => "/#setting/clusters/cluster-policies/view",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

macro_rules! remote_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

remote_id!(InstancePoolId);
remote_id!(PolicyId);

/// Whether a create-or-update call created a fresh resource or edited one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted<T> {
    pub id: T,
    pub action: UpsertAction,
}

impl<T> Upserted<T> {
    pub fn created(id: T) -> Self {
        Self {
            id,
            action: UpsertAction::Created,
        }
    }

    pub fn updated(id: T) -> Self {
        Self {
            id,
            action: UpsertAction::Updated,
        }
    }
}

/// Human-facing pointer to a freshly provisioned resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
    pub id: String,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            id: id.into(),
        }
    }
}
