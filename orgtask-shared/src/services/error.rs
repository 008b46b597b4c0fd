//! Service-level errors

use thiserror::Error;

use crate::auth::authorization::{AuthzError, Permission};
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// Error returned by every service operation
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller's role lacks the permission, or there is no caller
    #[error("Missing required permission: {0}")]
    PermissionDenied(Permission),

    /// Absent, or outside the caller's visible organizations
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A unique field is already taken
    #[error("{0}")]
    Conflict(String),

    /// Unknown email, wrong password or inactive account
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(StoreError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::PermissionDenied(permission) => ServiceError::PermissionDenied(permission),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => {
                ServiceError::Conflict(format!("Already exists ({})", constraint))
            }
            other => ServiceError::Storage(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
