//! Users, groups and the permission oracle
//!
//! Group 1 is the default group: its permissions apply to anonymous users
//! (when anonymous access is enabled) and to users without any group.
//! Members of group 2 hold every permission.

use crate::config::AuthConfig;
use lectern_types::RecordId;
use std::collections::{BTreeMap, BTreeSet};

pub const GROUP_DEFAULT_PK: RecordId = 1;
pub const GROUP_ADMIN_PK: RecordId = 2;

/// Identity of the caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// `None` for anonymous callers
    pub id: Option<RecordId>,
    pub username: String,
    pub groups: Vec<RecordId>,
}

impl CurrentUser {
    pub fn anonymous() -> Self {
        Self {
            id: None,
            username: "anonymous".to_string(),
            groups: Vec::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }

    /// Groups used for permission lookups
    fn effective_groups(&self) -> Vec<RecordId> {
        if self.groups.is_empty() {
            vec![GROUP_DEFAULT_PK]
        } else {
            self.groups.clone()
        }
    }
}

/// Answers permission questions about callers
pub trait PermissionOracle: Send + Sync {
    /// Resolve a user id to a caller
    fn user(&self, id: RecordId) -> Option<CurrentUser>;

    fn has_perm(&self, user: &CurrentUser, anonymous_enabled: bool, permission: &str) -> bool;

    fn in_some_groups(&self, user: &CurrentUser, groups: &[RecordId]) -> bool;
}

/// Oracle backed by the configured groups and users
#[derive(Debug, Clone, Default)]
pub struct GroupPermissions {
    groups: BTreeMap<RecordId, BTreeSet<String>>,
    users: BTreeMap<RecordId, CurrentUser>,
}

impl GroupPermissions {
    pub fn from_config(config: &AuthConfig) -> Self {
        let groups = config
            .groups
            .iter()
            .map(|group| (group.id, group.permissions.iter().cloned().collect()))
            .collect();
        let users = config
            .users
            .iter()
            .map(|user| {
                (
                    user.id,
                    CurrentUser {
                        id: Some(user.id),
                        username: user.username.clone(),
                        groups: user.groups.clone(),
                    },
                )
            })
            .collect();
        Self { groups, users }
    }

    fn group_has_perm(&self, group: RecordId, permission: &str) -> bool {
        self.groups
            .get(&group)
            .is_some_and(|permissions| permissions.contains(permission))
    }
}

impl PermissionOracle for GroupPermissions {
    fn user(&self, id: RecordId) -> Option<CurrentUser> {
        self.users.get(&id).cloned()
    }

    fn has_perm(&self, user: &CurrentUser, anonymous_enabled: bool, permission: &str) -> bool {
        if !user.is_authenticated() {
            return anonymous_enabled && self.group_has_perm(GROUP_DEFAULT_PK, permission);
        }
        let groups = user.effective_groups();
        if groups.contains(&GROUP_ADMIN_PK) {
            return true;
        }
        groups
            .iter()
            .any(|group| self.group_has_perm(*group, permission))
    }

    fn in_some_groups(&self, user: &CurrentUser, groups: &[RecordId]) -> bool {
        if !user.is_authenticated() {
            return groups.contains(&GROUP_DEFAULT_PK);
        }
        user.effective_groups()
            .iter()
            .any(|group| groups.contains(group))
    }
}
