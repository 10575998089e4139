// labforge-core/src/domain/permission.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Workspace group every provisioned resource is shared with.
pub const USERS_GROUP: &str = "users";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionLevel {
    CanAttachTo,
    CanUse,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CanAttachTo => "CAN_ATTACH_TO",
            Self::CanUse => "CAN_USE",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One `access_control_list` entry granting a group a permission level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupGrant {
    pub group_name: String,
    pub permission_level: PermissionLevel,
}

impl GroupGrant {
    pub fn new(group_name: impl Into<String>, permission_level: PermissionLevel) -> Self {
        Self {
            group_name: group_name.into(),
            permission_level,
        }
    }

    pub fn users(permission_level: PermissionLevel) -> Self {
        Self::new(USERS_GROUP, permission_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_serializes_as_acl_entry() -> anyhow::Result<()> {
        let grant = GroupGrant::users(PermissionLevel::CanAttachTo);
        let json = serde_json::to_value(&grant)?;
        assert_eq!(
            json,
            serde_json::json!({"group_name": "users", "permission_level": "CAN_ATTACH_TO"})
        );
        Ok(())
    }
}
