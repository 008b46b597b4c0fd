/// Task endpoints
///
/// All routes require a valid access token. Results are limited to the
/// organizations visible to the caller: their own, plus direct children when
/// their organization is a root. A task outside that set answers 404.
///
/// # Endpoints
///
/// - `POST   /v1/tasks` - Create a task (TASK_CREATE)
/// - `GET    /v1/tasks` - List visible tasks (TASK_READ)
/// - `GET    /v1/tasks/:id` - Get one task (TASK_READ)
/// - `PUT    /v1/tasks/:id` - Partially update a task (TASK_UPDATE)
/// - `DELETE /v1/tasks/:id` - Delete a task (TASK_DELETE)

use crate::{app::AppState, error::ApiResult, middleware::request_meta::ClientMeta};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use orgtask_shared::{
    auth::middleware::AuthContext,
    models::task::{Task, TaskCategory, TaskStatus, UpdateTask},
    services::tasks::NewTask,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,

    pub description: Option<String>,

    pub category: TaskCategory,

    pub status: TaskStatus,
}

impl From<CreateTaskRequest> for NewTask {
    fn from(req: CreateTaskRequest) -> Self {
        NewTask {
            title: req.title,
            description: req.description,
            category: req.category,
            status: req.status,
        }
    }
}

/// Create a task
///
/// The task belongs to the caller's organization and is owned by the caller.
///
/// # Endpoint
///
/// ```text
/// POST /v1/tasks
/// Authorization: Bearer <access token>
///
/// {
///   "title": "Setup CI/CD",
///   "description": "Configure pipeline for main app",
///   "category": "WORK",
///   "status": "TODO"
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Role lacks TASK_CREATE
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ClientMeta(meta): ClientMeta,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let task = state
        .services
        .tasks
        .create(auth.as_ref(), req.into(), &meta)
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// List tasks in every visible organization, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ClientMeta(meta): ClientMeta,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.services.tasks.list(auth.as_ref(), &meta).await?;
    Ok(Json(tasks))
}

/// Get one task
///
/// # Errors
///
/// - `404 Not Found`: Missing, or outside the caller's visible organizations
pub async fn get_task(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ClientMeta(meta): ClientMeta,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = state.services.tasks.get(auth.as_ref(), id, &meta).await?;
    Ok(Json(task))
}

/// Update a task
///
/// Only fields present in the body change; `"description": null` clears the
/// description.
///
/// # Endpoint
///
/// ```text
/// PUT /v1/tasks/:id
/// Authorization: Bearer <access token>
///
/// { "status": "COMPLETED" }
/// ```
pub async fn update_task(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ClientMeta(meta): ClientMeta,
    Path(id): Path<Uuid>,
    Json(changes): Json<UpdateTask>,
) -> ApiResult<Json<Task>> {
    let task = state
        .services
        .tasks
        .update(auth.as_ref(), id, changes, &meta)
        .await?;
    Ok(Json(task))
}

/// Delete a task
///
/// # Response
///
/// The deleted task as it was before deletion.
pub async fn delete_task(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ClientMeta(meta): ClientMeta,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = state.services.tasks.delete(auth.as_ref(), id, &meta).await?;
    Ok(Json(task))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let ok: CreateTaskRequest = serde_json::from_value(serde_json::json!({
            "title": "Setup CI/CD",
            "category": "WORK",
            "status": "TODO"
        }))
        .unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.description, None);

        let empty = CreateTaskRequest {
            title: String::new(),
            ..ok
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let parsed = serde_json::from_value::<CreateTaskRequest>(serde_json::json!({
            "title": "x",
            "category": "HOBBY",
            "status": "TODO"
        }));
        assert!(parsed.is_err());
    }
}
