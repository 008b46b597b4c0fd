//! Business logic
//!
//! Services receive their collaborators explicitly: a shared [`Store`] handle
//! and, for token issuance, the JWT secret. Nothing is looked up globally.
//!
//! - `visibility`: which organizations a caller can see
//! - `audit`: best-effort audit recording and the scoped audit read side
//! - `tasks`: organization-scoped task CRUD
//! - `accounts`: registration, login, token refresh
//! - `admin`: child organizations and user creation

use std::sync::Arc;

use crate::store::Store;

pub mod accounts;
pub mod admin;
pub mod audit;
pub mod error;
pub mod tasks;
pub mod visibility;

pub use error::{ServiceError, ServiceResult};

/// Every service wired to the same store
#[derive(Clone)]
pub struct Services {
    pub accounts: accounts::AccountService,
    pub admin: admin::AdminService,
    pub audit: audit::AuditRecorder,
    pub tasks: tasks::TaskService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, jwt_secret: impl Into<Arc<str>>) -> Self {
        Self {
            accounts: accounts::AccountService::new(store.clone(), jwt_secret),
            admin: admin::AdminService::new(store.clone()),
            audit: audit::AuditRecorder::new(store.clone()),
            tasks: tasks::TaskService::new(store),
        }
    }
}
