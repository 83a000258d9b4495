//! Per-action access tables
//!
//! Each resource lists the actions it supports together with the requirement
//! a caller must meet. Actions missing from a table are denied. Checks run
//! before any payload is looked at.

use crate::auth::{CurrentUser, PermissionOracle, GROUP_ADMIN_PK};
use crate::error::{ApiError, ApiResult};
use lectern_types::RecordId;

const SEE_PROJECTOR: &str = "core.can_see_projector";
const MANAGE_PROJECTOR: &str = "core.can_manage_projector";
const MANAGE_TAGS: &str = "core.can_manage_tags";
const MANAGE_CONFIG: &str = "core.can_manage_config";
const MANAGE_LOGOS_AND_FONTS: &str = "core.can_manage_logos_and_fonts";
const USE_CHAT: &str = "core.can_use_chat";
const MANAGE_CHAT: &str = "core.can_manage_chat";

/// What a caller must satisfy for one action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Every listed permission
    Perms(&'static [&'static str]),

    /// Any authenticated user, or anybody while anonymous access is enabled
    AuthenticatedOrAnonymous,

    /// An authenticated user holding the permission
    AuthenticatedWith(&'static str),

    /// Membership in one of the groups
    InGroups(&'static [RecordId]),

    /// Config writes: `logo*` and `font*` keys need their own permission
    ConfigWrite,
}

/// Access rules of one resource
#[derive(Debug)]
pub struct AccessTable {
    pub resource: &'static str,
    pub rules: &'static [(&'static str, Requirement)],
}

/// Everything a requirement may look at
pub struct AccessContext<'a> {
    pub oracle: &'a dyn PermissionOracle,
    pub user: &'a CurrentUser,
    pub anonymous_enabled: bool,
    /// Config key addressed by the request, if any
    pub config_key: Option<&'a str>,
}

impl AccessContext<'_> {
    fn has_perm(&self, permission: &str) -> bool {
        self.oracle
            .has_perm(self.user, self.anonymous_enabled, permission)
    }
}

impl Requirement {
    pub fn is_satisfied(&self, ctx: &AccessContext<'_>) -> bool {
        match self {
            Requirement::Perms(permissions) => permissions.iter().all(|p| ctx.has_perm(p)),
            Requirement::AuthenticatedOrAnonymous => {
                ctx.user.is_authenticated() || ctx.anonymous_enabled
            }
            Requirement::AuthenticatedWith(permission) => {
                ctx.user.is_authenticated() && ctx.has_perm(permission)
            }
            Requirement::InGroups(groups) => ctx.oracle.in_some_groups(ctx.user, groups),
            Requirement::ConfigWrite => {
                let key = ctx.config_key.unwrap_or_default();
                if key.starts_with("logo") || key.starts_with("font") {
                    ctx.has_perm(MANAGE_LOGOS_AND_FONTS)
                } else {
                    ctx.has_perm(MANAGE_CONFIG)
                }
            }
        }
    }
}

impl AccessTable {
    pub fn requirement(&self, action: &str) -> Option<Requirement> {
        self.rules
            .iter()
            .find(|(name, _)| *name == action)
            .map(|(_, requirement)| *requirement)
    }

    /// Fail with `PermissionDenied` unless the caller may run `action`
    pub fn check(&self, action: &str, ctx: &AccessContext<'_>) -> ApiResult<()> {
        let allowed = self
            .requirement(action)
            .is_some_and(|requirement| requirement.is_satisfied(ctx));
        if allowed {
            Ok(())
        } else {
            tracing::debug!(
                resource = self.resource,
                action,
                user = ?ctx.user.id,
                "Permission denied"
            );
            Err(ApiError::permission_denied())
        }
    }
}

const MANAGE_PROJECTOR_RULE: Requirement = Requirement::Perms(&[SEE_PROJECTOR, MANAGE_PROJECTOR]);

pub static PROJECTOR: AccessTable = AccessTable {
    resource: "core/projector",
    rules: &[
        ("list", Requirement::Perms(&[SEE_PROJECTOR])),
        ("retrieve", Requirement::Perms(&[SEE_PROJECTOR])),
        ("create", MANAGE_PROJECTOR_RULE),
        ("update", MANAGE_PROJECTOR_RULE),
        ("partial_update", MANAGE_PROJECTOR_RULE),
        ("destroy", MANAGE_PROJECTOR_RULE),
        ("activate_elements", MANAGE_PROJECTOR_RULE),
        ("prune_elements", MANAGE_PROJECTOR_RULE),
        ("update_elements", MANAGE_PROJECTOR_RULE),
        ("deactivate_elements", MANAGE_PROJECTOR_RULE),
        ("clear_elements", MANAGE_PROJECTOR_RULE),
        ("project", MANAGE_PROJECTOR_RULE),
        ("control_view", MANAGE_PROJECTOR_RULE),
        ("set_resolution", MANAGE_PROJECTOR_RULE),
        ("set_scroll", MANAGE_PROJECTOR_RULE),
        ("control_blank", MANAGE_PROJECTOR_RULE),
        ("broadcast", MANAGE_PROJECTOR_RULE),
        ("set_projectiondefault", MANAGE_PROJECTOR_RULE),
    ],
};

pub static PROJECTION_DEFAULT: AccessTable = AccessTable {
    resource: "core/projection-default",
    rules: &[
        ("list", Requirement::Perms(&[SEE_PROJECTOR])),
        ("retrieve", Requirement::Perms(&[SEE_PROJECTOR])),
    ],
};

pub static TAG: AccessTable = AccessTable {
    resource: "core/tag",
    rules: &[
        ("list", Requirement::AuthenticatedOrAnonymous),
        ("retrieve", Requirement::AuthenticatedOrAnonymous),
        ("create", Requirement::Perms(&[MANAGE_TAGS])),
        ("update", Requirement::Perms(&[MANAGE_TAGS])),
        ("partial_update", Requirement::Perms(&[MANAGE_TAGS])),
        ("destroy", Requirement::Perms(&[MANAGE_TAGS])),
    ],
};

pub static CONFIG: AccessTable = AccessTable {
    resource: "core/config",
    rules: &[
        ("list", Requirement::AuthenticatedOrAnonymous),
        ("retrieve", Requirement::AuthenticatedOrAnonymous),
        ("update", Requirement::ConfigWrite),
        ("partial_update", Requirement::ConfigWrite),
    ],
};

pub static CHAT_MESSAGE: AccessTable = AccessTable {
    resource: "core/chat-message",
    rules: &[
        ("list", Requirement::Perms(&[USE_CHAT])),
        ("retrieve", Requirement::Perms(&[USE_CHAT])),
        // Anonymous users never chat, even if the default group may
        ("create", Requirement::AuthenticatedWith(USE_CHAT)),
        ("clear", Requirement::Perms(&[USE_CHAT, MANAGE_CHAT])),
    ],
};

pub static PROJECTOR_MESSAGE: AccessTable = AccessTable {
    resource: "core/projector-message",
    rules: &[
        ("list", Requirement::Perms(&[SEE_PROJECTOR])),
        ("retrieve", Requirement::Perms(&[SEE_PROJECTOR])),
        ("create", Requirement::Perms(&[MANAGE_PROJECTOR])),
        ("update", Requirement::Perms(&[MANAGE_PROJECTOR])),
        ("partial_update", Requirement::Perms(&[MANAGE_PROJECTOR])),
        ("destroy", Requirement::Perms(&[MANAGE_PROJECTOR])),
    ],
};

pub static COUNTDOWN: AccessTable = AccessTable {
    resource: "core/countdown",
    rules: &[
        ("list", Requirement::Perms(&[SEE_PROJECTOR])),
        ("retrieve", Requirement::Perms(&[SEE_PROJECTOR])),
        ("create", Requirement::Perms(&[MANAGE_PROJECTOR])),
        ("update", Requirement::Perms(&[MANAGE_PROJECTOR])),
        ("partial_update", Requirement::Perms(&[MANAGE_PROJECTOR])),
        ("destroy", Requirement::Perms(&[MANAGE_PROJECTOR])),
    ],
};

pub static HISTORY: AccessTable = AccessTable {
    resource: "core/history",
    rules: &[
        ("list", Requirement::InGroups(&[GROUP_ADMIN_PK])),
        ("retrieve", Requirement::InGroups(&[GROUP_ADMIN_PK])),
        ("clear_history", Requirement::InGroups(&[GROUP_ADMIN_PK])),
        ("timeline", Requirement::InGroups(&[GROUP_ADMIN_PK])),
    ],
};

pub static AUTOUPDATE: AccessTable = AccessTable {
    resource: "autoupdate",
    rules: &[("stream", Requirement::AuthenticatedOrAnonymous)],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::GroupPermissions;
    use crate::config::AuthConfig;

    fn check(
        table: &AccessTable,
        action: &str,
        user: &CurrentUser,
        anonymous_enabled: bool,
        config_key: Option<&str>,
    ) -> bool {
        let oracle = GroupPermissions::from_config(&AuthConfig::default());
        let ctx = AccessContext {
            oracle: &oracle,
            user,
            anonymous_enabled,
            config_key,
        };
        table.check(action, &ctx).is_ok()
    }

    fn user(groups: Vec<RecordId>) -> CurrentUser {
        CurrentUser {
            id: Some(10),
            username: "someone".to_string(),
            groups,
        }
    }

    #[test]
    fn test_unknown_action_is_denied() {
        let admin = user(vec![GROUP_ADMIN_PK]);
        assert!(check(&PROJECTOR, "list", &admin, false, None));
        assert!(!check(&PROJECTOR, "metadata_dump", &admin, false, None));
        assert!(!check(&CHAT_MESSAGE, "destroy", &admin, false, None));
    }

    #[test]
    fn test_projector_writes_need_both_permissions() {
        // Default group can only see
        let delegate = user(vec![4]);
        assert!(check(&PROJECTOR, "retrieve", &delegate, false, None));
        assert!(!check(&PROJECTOR, "project", &delegate, false, None));

        let staff = user(vec![3]);
        assert!(check(&PROJECTOR, "project", &staff, false, None));
    }

    #[test]
    fn test_config_write_depends_on_key_prefix() {
        let oracle_config = AuthConfig {
            groups: vec![crate::config::GroupConfig {
                id: 5,
                name: "Designers".to_string(),
                permissions: vec![MANAGE_LOGOS_AND_FONTS.to_string()],
            }],
            users: vec![],
        };
        let oracle = GroupPermissions::from_config(&oracle_config);
        let designer = user(vec![5]);
        let ctx = |key| AccessContext {
            oracle: &oracle,
            user: &designer,
            anonymous_enabled: false,
            config_key: Some(key),
        };
        assert!(CONFIG.check("update", &ctx("logo_projector_main")).is_ok());
        assert!(CONFIG.check("partial_update", &ctx("font_bold")).is_ok());
        assert!(CONFIG.check("update", &ctx("general_event_name")).is_err());
    }

    #[test]
    fn test_anonymous_chat_is_refused() {
        let anonymous = CurrentUser::anonymous();
        assert!(!check(&CHAT_MESSAGE, "create", &anonymous, true, None));
        assert!(check(&TAG, "list", &anonymous, true, None));
        assert!(!check(&TAG, "list", &anonymous, false, None));
    }

    #[test]
    fn test_history_requires_admin_group() {
        assert!(check(&HISTORY, "timeline", &user(vec![GROUP_ADMIN_PK]), false, None));
        assert!(!check(&HISTORY, "timeline", &user(vec![3]), false, None));
        assert!(!check(&HISTORY, "list", &CurrentUser::anonymous(), true, None));
    }
}
