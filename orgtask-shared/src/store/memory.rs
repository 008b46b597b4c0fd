//! In-memory store
//!
//! Holds every table behind one `RwLock`, so multi-row operations such as
//! registration are atomic for free. Uniqueness rules match the PostgreSQL
//! schema and report the same constraint names.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuditStore, OrganizationStore, Store, StoreError, TaskStore, UserStore};
use crate::models::audit_log::{AuditLogEntry, NewAuditEntry};
use crate::models::organization::{CreateOrganization, Organization};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

#[derive(Debug, Default)]
struct Tables {
    organizations: Vec<Organization>,
    users: Vec<User>,
    tasks: Vec<Task>,
    audit_logs: Vec<AuditLogEntry>,
}

impl Tables {
    fn insert_organization(&mut self, data: CreateOrganization) -> Result<Organization, StoreError> {
        if self.organizations.iter().any(|o| o.name == data.name) {
            return Err(StoreError::Conflict("organizations_name_key".to_string()));
        }
        if let Some(parent_id) = data.parent_id {
            if !self.organizations.iter().any(|o| o.id == parent_id) {
                return Err(StoreError::Database(format!(
                    "parent organization {} does not exist",
                    parent_id
                )));
            }
        }

        let now = Utc::now();
        let organization = Organization {
            id: Uuid::new_v4(),
            name: data.name,
            org_type: data.org_type,
            parent_id: data.parent_id,
            created_at: now,
            updated_at: now,
        };
        self.organizations.push(organization.clone());
        Ok(organization)
    }

    fn insert_user(&mut self, data: CreateUser) -> Result<User, StoreError> {
        if self.users.iter().any(|u| u.email == data.email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }
        if !self.organizations.iter().any(|o| o.id == data.organization_id) {
            return Err(StoreError::Database(format!(
                "organization {} does not exist",
                data.organization_id
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            organization_id: data.organization_id,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        self.users.push(user.clone());
        Ok(user)
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    writes: AtomicUsize,
    fail_audit: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful mutations so far, audit appends included
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every subsequent audit append fail with `Unavailable`
    pub fn fail_audit_writes(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    /// Deactivates a user so logins are refused
    pub async fn deactivate_user(&self, id: Uuid) -> bool {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.is_active = false;
                user.updated_at = Utc::now();
                self.bump();
                true
            }
            None => false,
        }
    }

    /// Snapshot of every audit entry in insertion order, regardless of scope
    pub async fn all_audit_entries(&self) -> Vec<AuditLogEntry> {
        self.tables.read().await.audit_logs.clone()
    }

    fn bump(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn create_organization(
        &self,
        data: CreateOrganization,
    ) -> Result<Organization, StoreError> {
        let organization = self.tables.write().await.insert_organization(data)?;
        self.bump();
        Ok(organization)
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.organizations.iter().find(|o| o.id == id).cloned())
    }

    async fn find_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Organization>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.organizations.iter().find(|o| o.name == name).cloned())
    }

    async fn list_child_organizations(
        &self,
        parent_id: Uuid,
    ) -> Result<Vec<Organization>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .organizations
            .iter()
            .filter(|o| o.parent_id == Some(parent_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let user = self.tables.write().await.insert_user(data)?;
        self.bump();
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn record_login(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                let now = Utc::now();
                user.last_login_at = Some(now);
                user.updated_at = now;
                self.bump();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.organizations.iter().any(|o| o.id == data.organization_id) {
            return Err(StoreError::Database(format!(
                "organization {} does not exist",
                data.organization_id
            )));
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            organization_id: data.organization_id,
            owner_id: data.owner_id,
            title: data.title,
            description: data.description,
            category: data.category,
            status: data.status,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.push(task.clone());
        self.bump();
        Ok(task)
    }

    async fn find_task(&self, id: Uuid, org_ids: &[Uuid]) -> Result<Option<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .find(|t| t.id == id && org_ids.contains(&t.organization_id))
            .cloned())
    }

    async fn list_tasks(&self, org_ids: &[Uuid]) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .rev()
            .filter(|t| org_ids.contains(&t.organization_id))
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                data.apply_to(task);
                task.updated_at = Utc::now();
                let updated = task.clone();
                self.bump();
                Ok(Some(updated))
            }
            None => Ok(None),
        }
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != id);
        let removed = tables.tasks.len() < before;
        if removed {
            self.bump();
        }
        Ok(removed)
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append_audit(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, StoreError> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("audit writes disabled".to_string()));
        }
        if let Some(column) = entry.oversized_column() {
            return Err(StoreError::Database(format!(
                "value too long for column audit_logs.{}",
                column
            )));
        }

        let stored = AuditLogEntry {
            id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            actor_user_id: entry.actor_user_id,
            actor_organization_id: entry.actor_organization_id,
            action: entry.action,
            resource_type: entry.resource_type,
            resource_id: entry.resource_id,
            success: entry.success,
            reason: entry.reason,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
        };
        self.tables.write().await.audit_logs.push(stored.clone());
        self.bump();
        Ok(stored)
    }

    async fn list_audit(&self, org_id: Uuid) -> Result<Vec<AuditLogEntry>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .audit_logs
            .iter()
            .rev()
            .filter(|e| e.actor_organization_id == Some(org_id))
            .cloned()
            .collect())
    }

    async fn find_audit(
        &self,
        id: Uuid,
        org_id: Uuid,
    ) -> Result<Option<AuditLogEntry>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .audit_logs
            .iter()
            .find(|e| e.id == id && e.actor_organization_id == Some(org_id))
            .cloned())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_organization_with_owner(
        &self,
        organization: CreateOrganization,
        owner: CreateUser,
    ) -> Result<(Organization, User), StoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.iter().any(|u| u.email == owner.email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        let organization = tables.insert_organization(organization)?;
        let user = tables.insert_user(CreateUser {
            organization_id: organization.id,
            ..owner
        })?;

        self.bump();
        self.bump();
        Ok((organization, user))
    }
}
