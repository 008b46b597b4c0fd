//! Audit trail
//!
//! [`AuditRecorder::record`] is best-effort: a failed append is logged and
//! dropped, and the operation that triggered it carries on as if nothing
//! happened. The read side is OWNER-only and scoped to the caller's own
//! organization, with no roll-up to children. Reading the trail is itself
//! recorded as `AUDIT_LOG_READ`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use orgtask_shared::services::audit::{AuditAction, AuditEvent, AuditReason, AuditRecorder, RequestMetadata};
//! use orgtask_shared::store::MemoryStore;
//!
//! # async fn example() {
//! let recorder = AuditRecorder::new(Arc::new(MemoryStore::new()));
//! recorder
//!     .record(
//!         AuditEvent::failure(AuditAction::LoginFail, AuditReason::InvalidCredentials),
//!         &RequestMetadata::default(),
//!     )
//!     .await;
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::auth::authorization::{authorize, Permission};
use crate::auth::middleware::AuthContext;
use crate::models::audit_log::{AuditLogEntry, NewAuditEntry};
use crate::store::Store;

/// Audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    LoginSuccess,
    LoginFail,
    RegisterSuccess,
    RegisterFail,
    OrgCreate,
    UserCreate,
    TaskCreate,
    TaskRead,
    TaskUpdate,
    TaskDelete,
    AuditLogRead,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::LoginSuccess => "LOGIN_SUCCESS",
            AuditAction::LoginFail => "LOGIN_FAIL",
            AuditAction::RegisterSuccess => "REGISTER_SUCCESS",
            AuditAction::RegisterFail => "REGISTER_FAIL",
            AuditAction::OrgCreate => "ORG_CREATE",
            AuditAction::UserCreate => "USER_CREATE",
            AuditAction::TaskCreate => "TASK_CREATE",
            AuditAction::TaskRead => "TASK_READ",
            AuditAction::TaskUpdate => "TASK_UPDATE",
            AuditAction::TaskDelete => "TASK_DELETE",
            AuditAction::AuditLogRead => "AUDIT_LOG_READ",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an audited action failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditReason {
    InvalidCredentials,
    UserAlreadyExists,
    OrganizationAlreadyExists,
    ResourceNotFound,
    PermissionMissing,
    UserInactive,
}

impl AuditReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditReason::InvalidCredentials => "INVALID_CREDENTIALS",
            AuditReason::UserAlreadyExists => "USER_ALREADY_EXISTS",
            AuditReason::OrganizationAlreadyExists => "ORGANIZATION_ALREADY_EXISTS",
            AuditReason::ResourceNotFound => "RESOURCE_NOT_FOUND",
            AuditReason::PermissionMissing => "PERMISSION_MISSING",
            AuditReason::UserInactive => "USER_INACTIVE",
        }
    }
}

/// Kind of resource an audit entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditResourceType {
    Task,
    User,
    Org,
    Auth,
    AuditLog,
}

impl AuditResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditResourceType::Task => "TASK",
            AuditResourceType::User => "USER",
            AuditResourceType::Org => "ORG",
            AuditResourceType::Auth => "AUTH",
            AuditResourceType::AuditLog => "AUDIT_LOG",
        }
    }
}

/// Client details copied onto every audit entry of a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One audit entry before it is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub success: bool,
    pub reason: Option<AuditReason>,
    pub actor_user_id: Option<Uuid>,
    pub actor_organization_id: Option<Uuid>,
    pub resource_type: Option<AuditResourceType>,
    pub resource_id: Option<Uuid>,
}

impl AuditEvent {
    pub fn success(action: AuditAction) -> Self {
        Self {
            action,
            success: true,
            reason: None,
            actor_user_id: None,
            actor_organization_id: None,
            resource_type: None,
            resource_id: None,
        }
    }

    pub fn failure(action: AuditAction, reason: AuditReason) -> Self {
        Self {
            success: false,
            reason: Some(reason),
            ..Self::success(action)
        }
    }

    /// Sets the actor from an authenticated caller
    pub fn by(self, caller: &AuthContext) -> Self {
        self.actor(Some(caller.user_id), Some(caller.organization_id))
    }

    pub fn actor(mut self, user_id: Option<Uuid>, organization_id: Option<Uuid>) -> Self {
        self.actor_user_id = user_id;
        self.actor_organization_id = organization_id;
        self
    }

    pub fn resource(mut self, resource_type: AuditResourceType, resource_id: Option<Uuid>) -> Self {
        self.resource_type = Some(resource_type);
        self.resource_id = resource_id;
        self
    }

    fn into_entry(self, meta: &RequestMetadata) -> NewAuditEntry {
        NewAuditEntry {
            actor_user_id: self.actor_user_id,
            actor_organization_id: self.actor_organization_id,
            action: self.action.as_str().to_string(),
            resource_type: self.resource_type.map(|t| t.as_str().to_string()),
            resource_id: self.resource_id,
            success: self.success,
            reason: self.reason.map(|r| r.as_str().to_string()),
            ip_address: meta.ip_address.clone(),
            user_agent: meta.user_agent.clone(),
        }
    }
}

/// Appends and reads audit entries
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn Store>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Appends an entry, swallowing storage failures
    pub async fn record(&self, event: AuditEvent, meta: &RequestMetadata) {
        let action = event.action;
        let success = event.success;

        match self.store.append_audit(event.into_entry(meta)).await {
            Ok(entry) => {
                debug!(audit_id = %entry.id, action = action.as_str(), success, "Audit entry recorded");
            }
            Err(e) => {
                warn!(action = action.as_str(), success, error = %e, "Failed to record audit entry");
            }
        }
    }

    /// Entries produced by members of the caller's own organization, newest first
    pub async fn list_for_organization(
        &self,
        caller: Option<&AuthContext>,
        meta: &RequestMetadata,
    ) -> ServiceResult<Vec<AuditLogEntry>> {
        authorize(caller, Permission::AuditRead)?;
        let caller = caller.ok_or(ServiceError::PermissionDenied(Permission::AuditRead))?;

        let entries = self.store.list_audit(caller.organization_id).await?;

        self.record(
            AuditEvent::success(AuditAction::AuditLogRead)
                .by(caller)
                .resource(AuditResourceType::AuditLog, None),
            meta,
        )
        .await;

        Ok(entries)
    }

    /// One entry, only if it belongs to the caller's own organization
    pub async fn get_by_id(
        &self,
        caller: Option<&AuthContext>,
        id: Uuid,
        meta: &RequestMetadata,
    ) -> ServiceResult<AuditLogEntry> {
        authorize(caller, Permission::AuditRead)?;
        let caller = caller.ok_or(ServiceError::PermissionDenied(Permission::AuditRead))?;

        let entry = self.store.find_audit(id, caller.organization_id).await?;

        match entry {
            Some(entry) => {
                self.record(
                    AuditEvent::success(AuditAction::AuditLogRead)
                        .by(caller)
                        .resource(AuditResourceType::AuditLog, Some(id)),
                    meta,
                )
                .await;
                Ok(entry)
            }
            None => {
                self.record(
                    AuditEvent::failure(AuditAction::AuditLogRead, AuditReason::ResourceNotFound)
                        .by(caller)
                        .resource(AuditResourceType::AuditLog, Some(id)),
                    meta,
                )
                .await;
                Err(ServiceError::NotFound("Audit log"))
            }
        }
    }
}
