//! PostgreSQL store

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{AuditStore, OrganizationStore, Store, StoreError, TaskStore, UserStore};
use crate::db::pool::health_check;
use crate::models::audit_log::{AuditLogEntry, NewAuditEntry};
use crate::models::organization::{CreateOrganization, Organization};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrganizationStore for PgStore {
    async fn create_organization(
        &self,
        data: CreateOrganization,
    ) -> Result<Organization, StoreError> {
        Ok(Organization::create(&self.pool, data).await?)
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        Ok(Organization::find_by_id(&self.pool, id).await?)
    }

    async fn find_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Organization>, StoreError> {
        Ok(Organization::find_by_name(&self.pool, name).await?)
    }

    async fn list_child_organizations(
        &self,
        parent_id: Uuid,
    ) -> Result<Vec<Organization>, StoreError> {
        Ok(Organization::list_children(&self.pool, parent_id).await?)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn record_login(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(User::update_last_login(&self.pool, id).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn find_task(&self, id: Uuid, org_ids: &[Uuid]) -> Result<Option<Task>, StoreError> {
        if org_ids.is_empty() {
            return Ok(None);
        }
        Ok(Task::find_in_organizations(&self.pool, id, org_ids).await?)
    }

    async fn list_tasks(&self, org_ids: &[Uuid]) -> Result<Vec<Task>, StoreError> {
        if org_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Task::list_in_organizations(&self.pool, org_ids).await?)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        Ok(Task::update(&self.pool, id, data).await?)
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Task::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl AuditStore for PgStore {
    async fn append_audit(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, StoreError> {
        Ok(AuditLogEntry::append(&self.pool, entry).await?)
    }

    async fn list_audit(&self, org_id: Uuid) -> Result<Vec<AuditLogEntry>, StoreError> {
        Ok(AuditLogEntry::list_for_organization(&self.pool, org_id).await?)
    }

    async fn find_audit(
        &self,
        id: Uuid,
        org_id: Uuid,
    ) -> Result<Option<AuditLogEntry>, StoreError> {
        Ok(AuditLogEntry::find_in_organization(&self.pool, id, org_id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }

    async fn create_organization_with_owner(
        &self,
        organization: CreateOrganization,
        owner: CreateUser,
    ) -> Result<(Organization, User), StoreError> {
        let mut tx = self.pool.begin().await?;

        let organization = Organization::create(&mut *tx, organization).await?;
        let user = User::create(
            &mut *tx,
            CreateUser {
                organization_id: organization.id,
                ..owner
            },
        )
        .await?;

        tx.commit().await?;

        debug!(
            organization_id = %organization.id,
            user_id = %user.id,
            "Organization and owner committed"
        );
        Ok((organization, user))
    }
}
