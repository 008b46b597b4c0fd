//! Organization and user administration
//!
//! OWNER-only. A root organization's owner may add child organizations
//! beneath it (one level deep) and create users in any organization they can
//! see. Permission denials are not audited, the same as for tasks.

use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::accounts::validate_email;
use super::audit::{AuditAction, AuditEvent, AuditReason, AuditRecorder, AuditResourceType, RequestMetadata};
use super::error::{ServiceError, ServiceResult};
use super::visibility::allowed_organizations;
use crate::auth::authorization::{authorize, Permission};
use crate::auth::middleware::AuthContext;
use crate::auth::password::{hash_password, validate_password};
use crate::models::organization::{CreateOrganization, Organization, OrganizationType};
use crate::models::user::{CreateUser, Role, User};
use crate::store::{Store, StoreError};

/// Child organization to create under the caller's organization
#[derive(Debug, Clone, Deserialize)]
pub struct NewChildOrganization {
    pub name: String,
    #[serde(rename = "type", default = "default_child_type")]
    pub org_type: OrganizationType,
}

fn default_child_type() -> OrganizationType {
    OrganizationType::Team
}

/// User to create
#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
    pub email: String,
    pub password: String,
    pub role: Role,
    /// Defaults to the caller's organization
    pub organization_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn Store>,
    audit: AuditRecorder,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let audit = AuditRecorder::new(store.clone());
        Self { store, audit }
    }

    fn authorize<'a>(
        caller: Option<&'a AuthContext>,
        permission: Permission,
    ) -> ServiceResult<&'a AuthContext> {
        authorize(caller, permission)?;
        caller.ok_or(ServiceError::PermissionDenied(permission))
    }

    /// Creates a child of the caller's organization
    ///
    /// The caller's organization must itself be a root.
    pub async fn create_child_organization(
        &self,
        caller: Option<&AuthContext>,
        input: NewChildOrganization,
        meta: &RequestMetadata,
    ) -> ServiceResult<Organization> {
        let caller = Self::authorize(caller, Permission::OrgCreate)?;

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("name must not be empty".to_string()));
        }

        let parent = self
            .store
            .find_organization(caller.organization_id)
            .await?
            .ok_or(ServiceError::NotFound("Organization"))?;
        if !parent.is_root() {
            return Err(ServiceError::Validation(
                "only root organizations can have child organizations".to_string(),
            ));
        }

        let created = self
            .store
            .create_organization(CreateOrganization {
                name,
                org_type: input.org_type,
                parent_id: Some(parent.id),
            })
            .await;

        match created {
            Ok(organization) => {
                self.audit
                    .record(
                        AuditEvent::success(AuditAction::OrgCreate)
                            .by(caller)
                            .resource(AuditResourceType::Org, Some(organization.id)),
                        meta,
                    )
                    .await;
                info!(organization_id = %organization.id, parent_id = %parent.id, "Child organization created");
                Ok(organization)
            }
            Err(StoreError::Conflict(_)) => {
                self.audit
                    .record(
                        AuditEvent::failure(AuditAction::OrgCreate, AuditReason::OrganizationAlreadyExists)
                            .by(caller)
                            .resource(AuditResourceType::Org, None),
                        meta,
                    )
                    .await;
                Err(ServiceError::Conflict("Organization already exists".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Creates a user in one of the caller's visible organizations
    ///
    /// An organization outside the visible set is reported as not found.
    pub async fn create_user(
        &self,
        caller: Option<&AuthContext>,
        input: NewMember,
        meta: &RequestMetadata,
    ) -> ServiceResult<User> {
        let caller = Self::authorize(caller, Permission::UserCreate)?;
        validate_email(&input.email)?;
        validate_password(&input.password).map_err(ServiceError::Validation)?;

        let target = input.organization_id.unwrap_or(caller.organization_id);
        let visible = allowed_organizations(self.store.as_ref(), caller.organization_id).await?;
        if !visible.contains(&target) {
            self.audit
                .record(
                    AuditEvent::failure(AuditAction::UserCreate, AuditReason::ResourceNotFound)
                        .by(caller)
                        .resource(AuditResourceType::Org, Some(target)),
                    meta,
                )
                .await;
            return Err(ServiceError::NotFound("Organization"));
        }

        let password_hash = hash_password(&input.password)?;

        let created = self
            .store
            .create_user(CreateUser {
                email: input.email,
                password_hash,
                role: input.role,
                organization_id: target,
            })
            .await;

        match created {
            Ok(user) => {
                self.audit
                    .record(
                        AuditEvent::success(AuditAction::UserCreate)
                            .by(caller)
                            .resource(AuditResourceType::User, Some(user.id)),
                        meta,
                    )
                    .await;
                info!(user_id = %user.id, organization_id = %target, role = user.role.as_str(), "User created");
                Ok(user)
            }
            Err(StoreError::Conflict(_)) => {
                self.audit
                    .record(
                        AuditEvent::failure(AuditAction::UserCreate, AuditReason::UserAlreadyExists)
                            .by(caller)
                            .resource(AuditResourceType::User, None),
                        meta,
                    )
                    .await;
                Err(ServiceError::Conflict("User already exists".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
