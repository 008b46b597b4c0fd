//! Task access service
//!
//! Every operation runs the same four steps:
//!
//! 1. Check the caller's permission for the operation. A denial returns
//!    before any storage access and is not audited.
//! 2. Resolve the organizations visible to the caller.
//! 3. Run the storage operation restricted to those organizations.
//! 4. Record an audit entry.
//!
//! A task outside the visible set is indistinguishable from a missing one.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::audit::{AuditAction, AuditEvent, AuditReason, AuditRecorder, AuditResourceType, RequestMetadata};
use super::error::{ServiceError, ServiceResult};
use super::visibility::allowed_organizations;
use crate::auth::authorization::{authorize, Permission};
use crate::auth::middleware::AuthContext;
use crate::models::task::{CreateTask, Task, TaskCategory, TaskStatus, UpdateTask};
use crate::store::Store;

/// Longest accepted task title, matching the column width
pub const MAX_TITLE_LENGTH: usize = 255;

/// Task operations and the permission each one requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskOperation {
    Create,
    List,
    Get,
    Update,
    Delete,
}

impl TaskOperation {
    pub const ALL: [TaskOperation; 5] = [
        TaskOperation::Create,
        TaskOperation::List,
        TaskOperation::Get,
        TaskOperation::Update,
        TaskOperation::Delete,
    ];

    pub const fn required_permission(self) -> Permission {
        match self {
            TaskOperation::Create => Permission::TaskCreate,
            TaskOperation::List | TaskOperation::Get => Permission::TaskRead,
            TaskOperation::Update => Permission::TaskUpdate,
            TaskOperation::Delete => Permission::TaskDelete,
        }
    }

    pub const fn audit_action(self) -> AuditAction {
        match self {
            TaskOperation::Create => AuditAction::TaskCreate,
            TaskOperation::List | TaskOperation::Get => AuditAction::TaskRead,
            TaskOperation::Update => AuditAction::TaskUpdate,
            TaskOperation::Delete => AuditAction::TaskDelete,
        }
    }
}

/// Caller-supplied fields of a new task
///
/// Organization and owner are never accepted from input; they come from the
/// caller's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub category: TaskCategory,
    pub status: TaskStatus,
}

fn validate_title(title: &str) -> ServiceResult<()> {
    if title.trim().is_empty() {
        return Err(ServiceError::Validation("title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ServiceError::Validation(format!(
            "title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

/// Organization-scoped task CRUD
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
    audit: AuditRecorder,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let audit = AuditRecorder::new(store.clone());
        Self { store, audit }
    }

    /// Step 1: permission check; returns the caller on success
    fn authorize<'a>(
        &self,
        caller: Option<&'a AuthContext>,
        operation: TaskOperation,
    ) -> ServiceResult<&'a AuthContext> {
        let permission = operation.required_permission();
        authorize(caller, permission)?;
        caller.ok_or(ServiceError::PermissionDenied(permission))
    }

    /// Step 2: visible organization ids
    async fn scope(&self, caller: &AuthContext) -> ServiceResult<Vec<Uuid>> {
        Ok(allowed_organizations(self.store.as_ref(), caller.organization_id).await?)
    }

    fn event(operation: TaskOperation, caller: &AuthContext, task_id: Option<Uuid>) -> AuditEvent {
        AuditEvent::success(operation.audit_action())
            .by(caller)
            .resource(AuditResourceType::Task, task_id)
    }

    /// Creates a task in the caller's own organization, owned by the caller
    pub async fn create(
        &self,
        caller: Option<&AuthContext>,
        input: NewTask,
        meta: &RequestMetadata,
    ) -> ServiceResult<Task> {
        let caller = self.authorize(caller, TaskOperation::Create)?;
        validate_title(&input.title)?;

        let task = self
            .store
            .create_task(CreateTask {
                organization_id: caller.organization_id,
                owner_id: caller.user_id,
                title: input.title,
                description: input.description,
                category: input.category,
                status: input.status,
            })
            .await?;

        self.audit
            .record(Self::event(TaskOperation::Create, caller, Some(task.id)), meta)
            .await;

        info!(task_id = %task.id, organization_id = %task.organization_id, "Task created");
        Ok(task)
    }

    /// Every task in the caller's visible organizations
    pub async fn list(
        &self,
        caller: Option<&AuthContext>,
        meta: &RequestMetadata,
    ) -> ServiceResult<Vec<Task>> {
        let caller = self.authorize(caller, TaskOperation::List)?;
        let org_ids = self.scope(caller).await?;

        let tasks = self.store.list_tasks(&org_ids).await?;

        self.audit
            .record(Self::event(TaskOperation::List, caller, None), meta)
            .await;

        debug!(count = tasks.len(), organizations = org_ids.len(), "Tasks listed");
        Ok(tasks)
    }

    /// One visible task
    ///
    /// A miss is audited as a failed read before `NotFound` is returned.
    pub async fn get(
        &self,
        caller: Option<&AuthContext>,
        id: Uuid,
        meta: &RequestMetadata,
    ) -> ServiceResult<Task> {
        let caller = self.authorize(caller, TaskOperation::Get)?;
        let org_ids = self.scope(caller).await?;

        match self.store.find_task(id, &org_ids).await? {
            Some(task) => {
                self.audit
                    .record(Self::event(TaskOperation::Get, caller, Some(task.id)), meta)
                    .await;
                Ok(task)
            }
            None => {
                self.audit
                    .record(
                        AuditEvent::failure(AuditAction::TaskRead, AuditReason::ResourceNotFound)
                            .by(caller)
                            .resource(AuditResourceType::Task, Some(id)),
                        meta,
                    )
                    .await;
                Err(ServiceError::NotFound("Task"))
            }
        }
    }

    /// Partial update of a visible task
    pub async fn update(
        &self,
        caller: Option<&AuthContext>,
        id: Uuid,
        changes: UpdateTask,
        meta: &RequestMetadata,
    ) -> ServiceResult<Task> {
        let caller = self.authorize(caller, TaskOperation::Update)?;
        if let Some(title) = &changes.title {
            validate_title(title)?;
        }
        let org_ids = self.scope(caller).await?;

        let existing = self
            .store
            .find_task(id, &org_ids)
            .await?
            .ok_or(ServiceError::NotFound("Task"))?;

        let updated = if changes.is_empty() {
            existing
        } else {
            self.store
                .update_task(existing.id, changes)
                .await?
                .ok_or(ServiceError::NotFound("Task"))?
        };

        self.audit
            .record(Self::event(TaskOperation::Update, caller, Some(updated.id)), meta)
            .await;

        Ok(updated)
    }

    /// Hard-deletes a visible task and returns it as it was
    pub async fn delete(
        &self,
        caller: Option<&AuthContext>,
        id: Uuid,
        meta: &RequestMetadata,
    ) -> ServiceResult<Task> {
        let caller = self.authorize(caller, TaskOperation::Delete)?;
        let org_ids = self.scope(caller).await?;

        let existing = self
            .store
            .find_task(id, &org_ids)
            .await?
            .ok_or(ServiceError::NotFound("Task"))?;

        if !self.store.delete_task(existing.id).await? {
            return Err(ServiceError::NotFound("Task"));
        }

        self.audit
            .record(Self::event(TaskOperation::Delete, caller, Some(existing.id)), meta)
            .await;

        info!(task_id = %existing.id, "Task deleted");
        Ok(existing)
    }
}
