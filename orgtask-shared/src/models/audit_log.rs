/// Audit log model and database operations
///
/// Audit entries are append-only. Nothing in the service updates or deletes
/// them, and the foreign keys refuse to let a referenced user or organization
/// disappear underneath an entry.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE audit_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     occurred_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     actor_user_id UUID REFERENCES users(id) ON DELETE RESTRICT,
///     actor_org_id UUID REFERENCES organizations(id) ON DELETE RESTRICT,
///     action VARCHAR(64) NOT NULL,
///     resource_type VARCHAR(64),
///     resource_id UUID,
///     success BOOLEAN NOT NULL,
///     reason VARCHAR(255),
///     ip_address VARCHAR(64),
///     user_agent TEXT
/// );
///
/// CREATE INDEX idx_audit_logs_actor_org ON audit_logs(actor_org_id, occurred_at DESC);
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// `VARCHAR` widths of the `audit_logs` columns
pub const MAX_ACTION_LENGTH: usize = 64;
pub const MAX_RESOURCE_TYPE_LENGTH: usize = 64;
pub const MAX_REASON_LENGTH: usize = 255;
pub const MAX_IP_ADDRESS_LENGTH: usize = 64;

/// Stored audit entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,

    /// None when the actor could not be identified (e.g. unknown email at login)
    pub actor_user_id: Option<Uuid>,
    #[sqlx(rename = "actor_org_id")]
    pub actor_organization_id: Option<Uuid>,

    /// Action name from the audit catalog, e.g. `TASK_CREATE`
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<Uuid>,
    pub success: bool,
    pub reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Input for appending an audit entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub actor_user_id: Option<Uuid>,
    pub actor_organization_id: Option<Uuid>,
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<Uuid>,
    pub success: bool,
    pub reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAuditEntry {
    /// First column whose value is wider than the schema allows
    pub fn oversized_column(&self) -> Option<&'static str> {
        let too_long = |value: Option<&str>, max: usize| {
            value.map_or(false, |v| v.chars().count() > max)
        };

        if too_long(Some(&self.action), MAX_ACTION_LENGTH) {
            Some("action")
        } else if too_long(self.resource_type.as_deref(), MAX_RESOURCE_TYPE_LENGTH) {
            Some("resource_type")
        } else if too_long(self.reason.as_deref(), MAX_REASON_LENGTH) {
            Some("reason")
        } else if too_long(self.ip_address.as_deref(), MAX_IP_ADDRESS_LENGTH) {
            Some("ip_address")
        } else {
            None
        }
    }
}

impl AuditLogEntry {
    /// Appends a new entry
    pub async fn append(pool: &PgPool, data: NewAuditEntry) -> Result<Self, sqlx::Error> {
        let entry = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            INSERT INTO audit_logs (
                actor_user_id, actor_org_id, action, resource_type, resource_id,
                success, reason, ip_address, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, occurred_at, actor_user_id, actor_org_id, action,
                      resource_type, resource_id, success, reason, ip_address, user_agent
            "#,
        )
        .bind(data.actor_user_id)
        .bind(data.actor_organization_id)
        .bind(data.action)
        .bind(data.resource_type)
        .bind(data.resource_id)
        .bind(data.success)
        .bind(data.reason)
        .bind(data.ip_address)
        .bind(data.user_agent)
        .fetch_one(pool)
        .await?;

        Ok(entry)
    }

    /// Lists entries whose actor organization is `org_id`, newest first
    pub async fn list_for_organization(
        pool: &PgPool,
        org_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            SELECT id, occurred_at, actor_user_id, actor_org_id, action,
                   resource_type, resource_id, success, reason, ip_address, user_agent
            FROM audit_logs
            WHERE actor_org_id = $1
            ORDER BY occurred_at DESC
            "#,
        )
        .bind(org_id)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    /// Finds one entry, only if its actor organization is `org_id`
    pub async fn find_in_organization(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let entry = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            SELECT id, occurred_at, actor_user_id, actor_org_id, action,
                   resource_type, resource_id, success, reason, ip_address, user_agent
            FROM audit_logs
            WHERE id = $1 AND actor_org_id = $2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(pool)
        .await?;

        Ok(entry)
    }
}
