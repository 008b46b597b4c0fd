/// Organization endpoints
///
/// # Endpoints
///
/// - `POST /v1/organizations` - Create a child of the caller's organization (ORG_CREATE)

use crate::{app::AppState, error::ApiResult, middleware::request_meta::ClientMeta};
use axum::{extract::State, http::StatusCode, Json};
use orgtask_shared::{
    auth::middleware::AuthContext,
    models::organization::{Organization, OrganizationType},
    services::admin::NewChildOrganization,
};
use serde::Deserialize;
use validator::Validate;

/// Create organization request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,

    /// Defaults to TEAM
    #[serde(rename = "type")]
    pub org_type: Option<OrganizationType>,
}

/// Create a child organization
///
/// The caller's organization becomes the parent and must itself be a root.
///
/// # Endpoint
///
/// ```text
/// POST /v1/organizations
/// Authorization: Bearer <access token>
///
/// { "name": "Acme Engineering", "type": "TEAM" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Caller's organization is already a child
/// - `403 Forbidden`: Role lacks ORG_CREATE
/// - `409 Conflict`: Name already taken
pub async fn create_organization(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ClientMeta(meta): ClientMeta,
    Json(req): Json<CreateOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<Organization>)> {
    req.validate()?;

    let organization = state
        .services
        .admin
        .create_child_organization(
            auth.as_ref(),
            NewChildOrganization {
                name: req.name,
                org_type: req.org_type.unwrap_or(OrganizationType::Team),
            },
            &meta,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(organization)))
}
