//! Storage traits
//!
//! Services talk to persistence only through these traits. Two backends exist:
//!
//! - [`PgStore`]: PostgreSQL, delegating to the sqlx queries in [`crate::models`]
//! - [`MemoryStore`]: a single in-process lock around plain collections, used by
//!   tests and by anyone who wants to run the service without a database
//!
//! Scoping is the caller's job. Task lookups take the set of organization ids
//! the caller may see and never return a row outside it.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::audit_log::{AuditLogEntry, NewAuditEntry};
use crate::models::organization::{CreateOrganization, Organization};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique field already holds this value; carries the constraint name
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// Query failed
    #[error("Database error: {0}")]
    Database(String),

    /// Backend could not be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Conflict(
                db_err
                    .constraint()
                    .unwrap_or("unique constraint")
                    .to_string(),
            ),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

/// Organizations
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn create_organization(&self, data: CreateOrganization)
        -> Result<Organization, StoreError>;

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError>;

    async fn find_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Organization>, StoreError>;

    /// Direct children only
    async fn list_child_organizations(
        &self,
        parent_id: Uuid,
    ) -> Result<Vec<Organization>, StoreError>;
}

/// Users
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Stamps `last_login_at`; returns false if the user is gone
    async fn record_login(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError>;

    /// Looks up a task only among `org_ids`
    async fn find_task(&self, id: Uuid, org_ids: &[Uuid]) -> Result<Option<Task>, StoreError>;

    /// Newest first
    async fn list_tasks(&self, org_ids: &[Uuid]) -> Result<Vec<Task>, StoreError>;

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError>;

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Audit entries
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append_audit(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, StoreError>;

    /// Entries whose actor organization is exactly `org_id`, newest first
    async fn list_audit(&self, org_id: Uuid) -> Result<Vec<AuditLogEntry>, StoreError>;

    async fn find_audit(
        &self,
        id: Uuid,
        org_id: Uuid,
    ) -> Result<Option<AuditLogEntry>, StoreError>;
}

/// Everything the service needs from persistence
#[async_trait]
pub trait Store: OrganizationStore + UserStore + TaskStore + AuditStore {
    /// Cheap liveness probe
    async fn ping(&self) -> Result<(), StoreError>;

    /// Creates an organization and its first user atomically
    ///
    /// The user's `organization_id` is overwritten with the new organization's
    /// id. If either insert fails nothing is persisted.
    async fn create_organization_with_owner(
        &self,
        organization: CreateOrganization,
        owner: CreateUser,
    ) -> Result<(Organization, User), StoreError>;
}
