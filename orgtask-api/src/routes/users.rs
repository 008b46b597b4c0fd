/// User endpoints
///
/// # Endpoints
///
/// - `POST /v1/users` - Create a user in a visible organization (USER_CREATE)

use crate::{app::AppState, error::ApiResult, middleware::request_meta::ClientMeta};
use axum::{extract::State, http::StatusCode, Json};
use orgtask_shared::{
    auth::middleware::AuthContext,
    models::user::{Role, User},
    services::admin::NewMember,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub role: Role,

    /// Defaults to the caller's organization
    pub organization_id: Option<Uuid>,
}

/// Create a user
///
/// # Endpoint
///
/// ```text
/// POST /v1/users
/// Authorization: Bearer <access token>
///
/// {
///   "email": "viewer@acme.com",
///   "password": "secret1",
///   "role": "VIEWER",
///   "organization_id": "uuid"
/// }
/// ```
///
/// # Response
///
/// The created user, without the password hash.
///
/// # Errors
///
/// - `403 Forbidden`: Role lacks USER_CREATE
/// - `404 Not Found`: Organization not visible to the caller
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_user(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ClientMeta(meta): ClientMeta,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    req.validate()?;

    let user = state
        .services
        .admin
        .create_user(
            auth.as_ref(),
            NewMember {
                email: req.email,
                password: req.password,
                role: req.role,
                organization_id: req.organization_id,
            },
            &meta,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}
