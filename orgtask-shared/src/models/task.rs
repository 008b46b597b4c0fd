/// Task model and database operations
///
/// Tasks always belong to one organization and one owning user. Both are taken
/// from the caller's identity at creation time and never change afterwards.
/// Deletion is a hard delete.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_category AS ENUM ('WORK', 'PERSONAL', 'OTHER');
/// CREATE TYPE task_status AS ENUM ('TODO', 'IN_PROGRESS', 'COMPLETED');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     category task_category NOT NULL,
///     status task_status NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use orgtask_shared::models::task::{CreateTask, Task, TaskCategory, TaskStatus};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, org_id: Uuid, owner_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     organization_id: org_id,
///     owner_id,
///     title: "Setup CI".to_string(),
///     description: None,
///     category: TaskCategory::Work,
///     status: TaskStatus::Todo,
/// }).await?;
///
/// let visible = Task::list_in_organizations(&pool, &[org_id]).await?;
/// assert!(visible.iter().any(|t| t.id == task.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskCategory {
    Work,
    Personal,
    Other,
}

/// Task progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started
    Todo,

    /// Being worked on
    InProgress,

    /// Done
    Completed,
}

impl TaskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Work => "WORK",
            TaskCategory::Personal => "PERSONAL",
            TaskCategory::Other => "OTHER",
        }
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

/// Task record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Organization that owns the task
    #[sqlx(rename = "org_id")]
    pub organization_id: Uuid,

    /// User who created the task
    pub owner_id: Uuid,

    /// Short title
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Category
    pub category: TaskCategory,

    /// Progress status
    pub status: TaskStatus,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Owning organization (always the caller's organization)
    pub organization_id: Uuid,

    /// Owning user (always the caller)
    pub owner_id: Uuid,

    pub title: String,
    pub description: Option<String>,
    pub category: TaskCategory,
    pub status: TaskStatus,
}

/// Partial update for a task
///
/// Fields left as `None` keep their current value. `description` uses a
/// double option: `Some(None)` clears it, `None` leaves it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,

    #[serde(default, deserialize_with = "deserialize_present")]
    pub description: Option<Option<String>>,

    pub category: Option<TaskCategory>,
    pub status: Option<TaskStatus>,
}

/// Distinguishes an explicit `null` from an absent field
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl UpdateTask {
    /// Returns true if no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.status.is_none()
    }

    /// Applies the update to a task in place
    ///
    /// Used by stores that do not push the update down to SQL.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

impl Task {
    /// Creates a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (org_id, owner_id, title, description, category, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, org_id, owner_id, title, description, category, status,
                      created_at, updated_at
            "#,
        )
        .bind(data.organization_id)
        .bind(data.owner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.category)
        .bind(data.status)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, restricted to a set of organizations
    ///
    /// A task outside `org_ids` is reported exactly like a missing one.
    pub async fn find_in_organizations(
        pool: &PgPool,
        id: Uuid,
        org_ids: &[Uuid],
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, org_id, owner_id, title, description, category, status,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1 AND org_id = ANY($2)
            "#,
        )
        .bind(id)
        .bind(org_ids)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists every task belonging to any of the given organizations
    pub async fn list_in_organizations(
        pool: &PgPool,
        org_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, org_id, owner_id, title, description, category, status,
                   created_at, updated_at
            FROM tasks
            WHERE org_id = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_ids)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Applies a partial update
    ///
    /// Only fields present in `data` are written. Returns None if the task
    /// does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.category.is_some() {
            bind_count += 1;
            query.push_str(&format!(", category = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, org_id, owner_id, title, description, category, status, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(category) = data.category {
            q = q.bind(category);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Hard-deletes a task
    ///
    /// Returns true if a row was removed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Setup CI".to_string(),
            description: Some("pipeline".to_string()),
            category: TaskCategory::Work,
            status: TaskStatus::Todo,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"IN_PROGRESS\"");
        assert_eq!(serde_json::to_string(&TaskCategory::Personal).unwrap(), "\"PERSONAL\"");
        assert_eq!(TaskStatus::Completed.as_str(), "COMPLETED");
        assert_eq!(TaskCategory::Other.as_str(), "OTHER");
        assert!(serde_json::from_str::<TaskStatus>("\"DONE\"").is_err());
    }

    #[test]
    fn test_update_task_absent_vs_null_description() {
        let absent: UpdateTask = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
        assert_eq!(absent.title.as_deref(), Some("New"));
        assert_eq!(absent.description, None);

        let cleared: UpdateTask = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: UpdateTask = serde_json::from_str(r#"{"description": "text"}"#).unwrap();
        assert_eq!(set.description, Some(Some("text".to_string())));
    }

    #[test]
    fn test_update_task_is_empty() {
        assert!(UpdateTask::default().is_empty());
        let update = UpdateTask {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_apply_partial_update() {
        let mut task = sample_task();
        let update = UpdateTask {
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        };

        update.apply_to(&mut task);

        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.title, "Setup CI");
        assert_eq!(task.description.as_deref(), Some("pipeline"));
        assert_eq!(task.category, TaskCategory::Work);
    }

    #[test]
    fn test_apply_clears_description() {
        let mut task = sample_task();
        let update = UpdateTask {
            description: Some(None),
            ..Default::default()
        };

        update.apply_to(&mut task);

        assert!(task.description.is_none());
    }
}
