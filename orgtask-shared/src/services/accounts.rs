//! Registration, login and token refresh
//!
//! Every outcome that matters for security lands in the audit trail: failed
//! logins (with no actor when the email is unknown), duplicate registrations,
//! and the three entries of a successful registration (`ORG_CREATE`,
//! `USER_CREATE`, `REGISTER_SUCCESS`).

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::audit::{AuditAction, AuditEvent, AuditReason, AuditRecorder, AuditResourceType, RequestMetadata};
use super::error::{ServiceError, ServiceResult};
use crate::auth::jwt::{create_token, validate_refresh_token, Claims, TokenType};
use crate::auth::password::{hash_password, validate_password, verify_dummy_password, verify_password};
use crate::models::organization::{CreateOrganization, OrganizationType};
use crate::models::user::{CreateUser, Role, User};
use crate::store::{Store, StoreError};

/// Self-service sign-up: creates a root organization and its owner
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub org_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Tokens issued on registration and login
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
}

/// Minimal shape check; full address validation happens at the HTTP boundary
pub(crate) fn validate_email(email: &str) -> ServiceResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ServiceError::Validation("email must be a valid address".to_string())),
    }
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    audit: AuditRecorder,
    jwt_secret: Arc<str>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, jwt_secret: impl Into<Arc<str>>) -> Self {
        let audit = AuditRecorder::new(store.clone());
        Self {
            store,
            audit,
            jwt_secret: jwt_secret.into(),
        }
    }

    fn issue_tokens(&self, user: &User) -> ServiceResult<AuthTokens> {
        let access_token = create_token(&Claims::for_user(user, TokenType::Access), &self.jwt_secret)?;
        let refresh_token = create_token(&Claims::for_user(user, TokenType::Refresh), &self.jwt_secret)?;

        Ok(AuthTokens {
            user_id: user.id,
            organization_id: user.organization_id,
            access_token,
            refresh_token,
        })
    }

    async fn reject_registration(
        &self,
        reason: AuditReason,
        meta: &RequestMetadata,
    ) -> ServiceError {
        self.audit
            .record(
                AuditEvent::failure(AuditAction::RegisterFail, reason)
                    .resource(AuditResourceType::Auth, None),
                meta,
            )
            .await;

        let message = match reason {
            AuditReason::OrganizationAlreadyExists => "Organization already exists",
            _ => "User already exists",
        };
        ServiceError::Conflict(message.to_string())
    }

    /// Creates a root COMPANY organization with an OWNER user, atomically
    pub async fn register(
        &self,
        input: Registration,
        meta: &RequestMetadata,
    ) -> ServiceResult<AuthTokens> {
        validate_email(&input.email)?;
        validate_password(&input.password).map_err(ServiceError::Validation)?;
        let org_name = input.org_name.trim().to_string();
        if org_name.is_empty() {
            return Err(ServiceError::Validation("org_name must not be empty".to_string()));
        }

        if self.store.find_user_by_email(&input.email).await?.is_some() {
            return Err(self.reject_registration(AuditReason::UserAlreadyExists, meta).await);
        }
        if self.store.find_organization_by_name(&org_name).await?.is_some() {
            return Err(self
                .reject_registration(AuditReason::OrganizationAlreadyExists, meta)
                .await);
        }

        let password_hash = hash_password(&input.password)?;

        let created = self
            .store
            .create_organization_with_owner(
                CreateOrganization {
                    name: org_name,
                    org_type: OrganizationType::Company,
                    parent_id: None,
                },
                CreateUser {
                    email: input.email,
                    password_hash,
                    role: Role::Owner,
                    organization_id: Uuid::nil(),
                },
            )
            .await;

        let (organization, user) = match created {
            Ok(pair) => pair,
            // Lost a race with a concurrent registration
            Err(StoreError::Conflict(constraint)) => {
                let reason = if constraint.contains("email") {
                    AuditReason::UserAlreadyExists
                } else {
                    AuditReason::OrganizationAlreadyExists
                };
                return Err(self.reject_registration(reason, meta).await);
            }
            Err(e) => return Err(e.into()),
        };

        self.audit
            .record(
                AuditEvent::success(AuditAction::OrgCreate)
                    .actor(Some(user.id), Some(organization.id))
                    .resource(AuditResourceType::Org, Some(organization.id)),
                meta,
            )
            .await;
        self.audit
            .record(
                AuditEvent::success(AuditAction::UserCreate)
                    .actor(Some(user.id), Some(organization.id))
                    .resource(AuditResourceType::User, Some(user.id)),
                meta,
            )
            .await;

        let tokens = self.issue_tokens(&user)?;

        self.audit
            .record(
                AuditEvent::success(AuditAction::RegisterSuccess)
                    .actor(Some(user.id), Some(organization.id))
                    .resource(AuditResourceType::Auth, None),
                meta,
            )
            .await;

        info!(user_id = %user.id, organization_id = %organization.id, "Registered new organization");
        Ok(tokens)
    }

    /// Exchanges email and password for tokens
    ///
    /// Unknown email, wrong password and inactive account all come back as
    /// `InvalidCredentials`; only the audit trail tells them apart.
    pub async fn login(
        &self,
        input: Credentials,
        meta: &RequestMetadata,
    ) -> ServiceResult<AuthTokens> {
        let user = match self.store.find_user_by_email(&input.email).await? {
            Some(user) => user,
            None => {
                verify_dummy_password(&input.password);
                self.audit
                    .record(
                        AuditEvent::failure(AuditAction::LoginFail, AuditReason::InvalidCredentials)
                            .resource(AuditResourceType::Auth, None),
                        meta,
                    )
                    .await;
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let failure = if !verify_password(&input.password, &user.password_hash)? {
            Some(AuditReason::InvalidCredentials)
        } else if !user.is_active {
            Some(AuditReason::UserInactive)
        } else {
            None
        };

        if let Some(reason) = failure {
            self.audit
                .record(
                    AuditEvent::failure(AuditAction::LoginFail, reason)
                        .actor(Some(user.id), Some(user.organization_id))
                        .resource(AuditResourceType::Auth, None),
                    meta,
                )
                .await;
            warn!(user_id = %user.id, reason = reason.as_str(), "Login rejected");
            return Err(ServiceError::InvalidCredentials);
        }

        self.store.record_login(user.id).await?;
        let tokens = self.issue_tokens(&user)?;

        self.audit
            .record(
                AuditEvent::success(AuditAction::LoginSuccess)
                    .actor(Some(user.id), Some(user.organization_id))
                    .resource(AuditResourceType::Auth, None),
                meta,
            )
            .await;

        Ok(tokens)
    }

    /// Issues a new access token for a still-active user
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<String> {
        let claims = validate_refresh_token(refresh_token, &self.jwt_secret)?;

        let user = self
            .store
            .find_user(claims.sub)
            .await?
            .filter(|user| user.is_active)
            .ok_or(ServiceError::InvalidCredentials)?;

        Ok(create_token(&Claims::for_user(&user, TokenType::Access), &self.jwt_secret)?)
    }
}
