/// Database models for OrgTask
///
/// Each model owns its sqlx queries. Services never call these directly; they
/// go through the [`crate::store`] traits so the same logic runs against
/// PostgreSQL and the in-memory store.
///
/// # Models
///
/// - `organization`: Tenants, optionally nested one level under a root
/// - `user`: Accounts with a role inside one organization
/// - `task`: Organization-scoped work items
/// - `audit_log`: Append-only record of security-relevant actions
///
/// # Example
///
/// ```no_run
/// use orgtask_shared::models::organization::Organization;
/// use orgtask_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// if let Some(acme) = Organization::find_by_name(&pool, "Acme Corp").await? {
///     let teams = Organization::list_children(&pool, acme.id).await?;
///     println!("{} has {} teams", acme.name, teams.len());
/// }
/// # Ok(())
/// # }
/// ```

pub mod audit_log;
pub mod organization;
pub mod task;
pub mod user;
