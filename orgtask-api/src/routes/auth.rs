/// Authentication endpoints
///
/// Public; no token required.
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Create an organization and its owner
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Refresh access token

use crate::{app::AppState, error::ApiResult, middleware::request_meta::ClientMeta};
use axum::{extract::State, http::StatusCode, Json};
use orgtask_shared::services::accounts::{AuthTokens, Credentials, Registration};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Name of the new root organization
    #[validate(length(min = 1, max = 255, message = "Organization name must be 1 to 255 characters"))]
    pub org_name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Register a new organization
///
/// Creates a root COMPANY organization and its OWNER in one transaction.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "owner@acme.com",
///   "password": "secret1",
///   "org_name": "Acme"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "user_id": "uuid",
///   "organization_id": "uuid",
///   "access_token": "eyJ...",
///   "refresh_token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email or organization name already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    ClientMeta(meta): ClientMeta,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthTokens>)> {
    req.validate()?;

    let tokens = state
        .services
        .accounts
        .register(
            Registration {
                email: req.email,
                password: req.password,
                org_name: req.org_name,
            },
            &meta,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(tokens)))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "owner@acme.com",
///   "password": "secret1"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email, wrong password or inactive account
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    ClientMeta(meta): ClientMeta,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthTokens>> {
    req.validate()?;

    let tokens = state
        .services
        .accounts
        .login(
            Credentials {
                email: req.email,
                password: req.password,
            },
            &meta,
        )
        .await?;

    Ok(Json(tokens))
}

/// Token refresh endpoint
///
/// Exchanges a refresh token for a new access token.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token, or inactive user
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = state.services.accounts.refresh(&req.refresh_token).await?;

    Ok(Json(RefreshResponse { access_token }))
}
