pub mod error;
pub mod lifecycle;
pub mod permission;
pub mod policy;
pub mod pool;
pub mod ports;
pub mod resource;
pub mod sanitize;
pub mod tags;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use error::DomainError;
pub use lifecycle::{SlotEvent, SlotState, SlotTrace};
pub use permission::{GroupGrant, PermissionLevel, USERS_GROUP};
pub use pool::{InstancePoolRequest, InstancePoolSpec, POOL_DEFAULT_NAME};
pub use resource::{InstancePoolId, PolicyId, ResourceKind, ResourceRef, UpsertAction, Upserted};
pub use sanitize::CleanStringSanitizer;
pub use tags::{ContextOverrides, Tag, TagNamespace, TagSet, WorkspaceContext};
