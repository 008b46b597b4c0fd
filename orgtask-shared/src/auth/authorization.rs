/// Role-based authorization
///
/// Every role maps to a fixed set of permissions. The table below is the only
/// place a permission is ever granted:
///
/// | Role   | Permissions                                                        |
/// |--------|--------------------------------------------------------------------|
/// | VIEWER | TASK_READ                                                          |
/// | ADMIN  | TASK_READ, TASK_CREATE, TASK_UPDATE, TASK_DELETE                   |
/// | OWNER  | all of the above plus AUDIT_READ, ORG_CREATE, USER_CREATE          |
///
/// Checks are pure functions of the caller's role. A missing identity or a
/// missing role is always a denial.
///
/// # Example
///
/// ```
/// use orgtask_shared::auth::authorization::{require_permission, Permission};
/// use orgtask_shared::models::user::Role;
///
/// assert!(require_permission(Some(Role::Admin), Permission::TaskDelete).is_ok());
/// assert!(require_permission(Some(Role::Admin), Permission::AuditRead).is_err());
/// assert!(require_permission(None, Permission::TaskRead).is_err());
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::middleware::AuthContext;
use crate::models::user::Role;

/// Atomic capability gating one kind of operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    TaskCreate,
    TaskRead,
    TaskUpdate,
    TaskDelete,
    AuditRead,
    OrgCreate,
    UserCreate,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::TaskCreate => "TASK_CREATE",
            Permission::TaskRead => "TASK_READ",
            Permission::TaskUpdate => "TASK_UPDATE",
            Permission::TaskDelete => "TASK_DELETE",
            Permission::AuditRead => "AUDIT_READ",
            Permission::OrgCreate => "ORG_CREATE",
            Permission::UserCreate => "USER_CREATE",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const VIEWER_PERMISSIONS: &[Permission] = &[Permission::TaskRead];

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::TaskRead,
    Permission::TaskCreate,
    Permission::TaskUpdate,
    Permission::TaskDelete,
];

const OWNER_PERMISSIONS: &[Permission] = &[
    Permission::TaskRead,
    Permission::TaskCreate,
    Permission::TaskUpdate,
    Permission::TaskDelete,
    Permission::AuditRead,
    Permission::OrgCreate,
    Permission::UserCreate,
];

/// Permissions granted to a role
pub fn permissions_of(role: Role) -> &'static [Permission] {
    match role {
        Role::Viewer => VIEWER_PERMISSIONS,
        Role::Admin => ADMIN_PERMISSIONS,
        Role::Owner => OWNER_PERMISSIONS,
    }
}

/// Returns true if `role` carries `permission`
pub fn has_permission(role: Role, permission: Permission) -> bool {
    permissions_of(role).contains(&permission)
}

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("Missing required permission: {0}")]
    PermissionDenied(Permission),
}

/// Fails unless `role` is present and carries `permission`
pub fn require_permission(role: Option<Role>, permission: Permission) -> Result<(), AuthzError> {
    match role {
        Some(role) if has_permission(role, permission) => Ok(()),
        _ => Err(AuthzError::PermissionDenied(permission)),
    }
}

/// Same as [`require_permission`] for an optional authenticated caller
pub fn authorize(caller: Option<&AuthContext>, permission: Permission) -> Result<(), AuthzError> {
    require_permission(caller.map(|c| c.role), permission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const TASK_PERMISSIONS: [Permission; 4] = [
        Permission::TaskCreate,
        Permission::TaskRead,
        Permission::TaskUpdate,
        Permission::TaskDelete,
    ];

    fn task_set(role: Role) -> Vec<Permission> {
        TASK_PERMISSIONS
            .iter()
            .copied()
            .filter(|p| has_permission(role, *p))
            .collect()
    }

    #[test]
    fn test_permission_table() {
        assert_eq!(permissions_of(Role::Viewer), &[Permission::TaskRead]);
        assert_eq!(permissions_of(Role::Admin).len(), 4);
        assert_eq!(permissions_of(Role::Owner).len(), 7);

        assert!(!has_permission(Role::Admin, Permission::AuditRead));
        assert!(!has_permission(Role::Admin, Permission::OrgCreate));
        assert!(!has_permission(Role::Admin, Permission::UserCreate));
        assert!(has_permission(Role::Owner, Permission::AuditRead));
    }

    #[test]
    fn test_task_permissions_form_a_chain() {
        let viewer = task_set(Role::Viewer);
        let admin = task_set(Role::Admin);
        let owner = task_set(Role::Owner);

        assert!(viewer.iter().all(|p| admin.contains(p)));
        assert!(admin.iter().all(|p| owner.contains(p)));
        assert_eq!(admin, owner);
    }

    #[test]
    fn test_require_permission() {
        assert!(require_permission(Some(Role::Viewer), Permission::TaskRead).is_ok());
        assert_eq!(
            require_permission(Some(Role::Viewer), Permission::TaskCreate),
            Err(AuthzError::PermissionDenied(Permission::TaskCreate))
        );
        assert_eq!(
            require_permission(None, Permission::TaskRead),
            Err(AuthzError::PermissionDenied(Permission::TaskRead))
        );
    }

    #[test]
    fn test_authorize_with_context() {
        let admin = AuthContext {
            user_id: Uuid::new_v4(),
            email: "admin@acme.com".to_string(),
            role: Role::Admin,
            organization_id: Uuid::new_v4(),
        };

        assert!(authorize(Some(&admin), Permission::TaskUpdate).is_ok());
        assert!(authorize(Some(&admin), Permission::UserCreate).is_err());
        assert!(authorize(None, Permission::TaskRead).is_err());
    }

    #[test]
    fn test_authz_error_display() {
        let err = AuthzError::PermissionDenied(Permission::AuditRead);
        assert_eq!(err.to_string(), "Missing required permission: AUDIT_READ");
    }
}
