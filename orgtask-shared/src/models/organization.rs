/// Organization model and database operations
///
/// Organizations are the tenant boundary. An organization may have a parent,
/// which makes it a "child"; one without a parent is a "root". Only one level
/// of nesting is created by the service, although the schema allows more.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE organization_type AS ENUM ('COMPANY', 'TEAM', 'PROJECT');
///
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL UNIQUE,
///     type organization_type NOT NULL DEFAULT 'COMPANY',
///     parent_org_id UUID REFERENCES organizations(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use orgtask_shared::models::organization::{CreateOrganization, Organization, OrganizationType};
/// use orgtask_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let acme = Organization::create(&pool, CreateOrganization {
///     name: "Acme Corp".to_string(),
///     org_type: OrganizationType::Company,
///     parent_id: None,
/// }).await?;
///
/// let children = Organization::list_children(&pool, acme.id).await?;
/// assert!(children.is_empty());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Kind of organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "organization_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationType {
    /// Top-level company account
    Company,

    /// Team inside a company
    Team,

    /// Project workspace
    Project,
}

impl OrganizationType {
    /// Converts type to its stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationType::Company => "COMPANY",
            OrganizationType::Team => "TEAM",
            OrganizationType::Project => "PROJECT",
        }
    }
}

/// Organization (tenant) record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Unique organization ID
    pub id: Uuid,

    /// Display name, unique across the system
    pub name: String,

    /// Organization kind
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub org_type: OrganizationType,

    /// Parent organization (None for root organizations)
    #[sqlx(rename = "parent_org_id")]
    pub parent_id: Option<Uuid>,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Returns true if this organization has no parent
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Input for creating a new organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    /// Organization name (must be unique)
    pub name: String,

    /// Organization kind
    #[serde(rename = "type", default = "default_type")]
    pub org_type: OrganizationType,

    /// Parent organization, if any
    pub parent_id: Option<Uuid>,
}

fn default_type() -> OrganizationType {
    OrganizationType::Company
}

impl Organization {
    /// Creates a new organization
    ///
    /// Accepts any executor so it can run inside the registration transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already taken (unique constraint
    /// `organizations_name_key`) or the parent does not exist.
    pub async fn create<'e, E>(executor: E, data: CreateOrganization) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, type, parent_org_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, type, parent_org_id, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.org_type)
        .bind(data.parent_id)
        .fetch_one(executor)
        .await?;

        Ok(organization)
    }

    /// Finds an organization by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, type, parent_org_id, created_at, updated_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(organization)
    }

    /// Finds an organization by its unique name (case-sensitive)
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, type, parent_org_id, created_at, updated_at
            FROM organizations
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(organization)
    }

    /// Lists the direct children of an organization
    ///
    /// Only one level is returned; grandchildren are not included.
    pub async fn list_children(pool: &PgPool, parent_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let organizations = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, type, parent_org_id, created_at, updated_at
            FROM organizations
            WHERE parent_org_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(parent_id)
        .fetch_all(pool)
        .await?;

        Ok(organizations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organization_type_as_str() {
        assert_eq!(OrganizationType::Company.as_str(), "COMPANY");
        assert_eq!(OrganizationType::Team.as_str(), "TEAM");
        assert_eq!(OrganizationType::Project.as_str(), "PROJECT");
    }

    #[test]
    fn test_organization_type_serde() {
        let json = serde_json::to_string(&OrganizationType::Team).unwrap();
        assert_eq!(json, "\"TEAM\"");

        let parsed: OrganizationType = serde_json::from_str("\"PROJECT\"").unwrap();
        assert_eq!(parsed, OrganizationType::Project);
    }

    #[test]
    fn test_create_organization_defaults_to_company() {
        let data: CreateOrganization = serde_json::from_str(r#"{"name": "Acme", "parent_id": null}"#).unwrap();
        assert_eq!(data.org_type, OrganizationType::Company);
        assert!(data.parent_id.is_none());
    }

    #[test]
    fn test_is_root() {
        let now = Utc::now();
        let mut org = Organization {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            org_type: OrganizationType::Company,
            parent_id: None,
            created_at: now,
            updated_at: now,
        };
        assert!(org.is_root());

        org.parent_id = Some(Uuid::new_v4());
        assert!(!org.is_root());
    }
}
