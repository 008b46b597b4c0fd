/// Audit log endpoints
///
/// OWNER-only. Entries are limited to those whose actor belongs to the
/// caller's own organization; child organizations are not rolled up. Every
/// read is itself recorded as `AUDIT_LOG_READ`.
///
/// # Endpoints
///
/// - `GET /v1/audit-logs` - List entries, newest first (AUDIT_READ)
/// - `GET /v1/audit-logs/:id` - Get one entry (AUDIT_READ)

use crate::{app::AppState, error::ApiResult, middleware::request_meta::ClientMeta};
use axum::{
    extract::{Path, State},
    Json,
};
use orgtask_shared::{auth::middleware::AuthContext, models::audit_log::AuditLogEntry};
use uuid::Uuid;

pub async fn list_audit_logs(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ClientMeta(meta): ClientMeta,
) -> ApiResult<Json<Vec<AuditLogEntry>>> {
    let entries = state
        .services
        .audit
        .list_for_organization(auth.as_ref(), &meta)
        .await?;
    Ok(Json(entries))
}

/// Get one audit entry
///
/// # Errors
///
/// - `404 Not Found`: Missing, or recorded by another organization
pub async fn get_audit_log(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ClientMeta(meta): ClientMeta,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AuditLogEntry>> {
    let entry = state
        .services
        .audit
        .get_by_id(auth.as_ref(), id, &meta)
        .await?;
    Ok(Json(entry))
}
