//! Organization visibility
//!
//! Members of a root organization see their own organization and its direct
//! children. Members of a child organization see only their own. The roll-up
//! is a single level; grandchildren never become visible.

use uuid::Uuid;

use crate::store::{OrganizationStore, StoreError};

/// Organization ids visible to a caller whose organization is `org_id`
///
/// The caller's own id always comes first. An organization that no longer
/// exists yields an empty set, so every scoped lookup fails closed.
pub async fn allowed_organizations<S>(store: &S, org_id: Uuid) -> Result<Vec<Uuid>, StoreError>
where
    S: OrganizationStore + ?Sized,
{
    let organization = match store.find_organization(org_id).await? {
        Some(organization) => organization,
        None => {
            tracing::warn!(%org_id, "Caller organization not found, nothing is visible");
            return Ok(Vec::new());
        }
    };

    if !organization.is_root() {
        return Ok(vec![organization.id]);
    }

    let children = store.list_child_organizations(organization.id).await?;

    let mut allowed = Vec::with_capacity(children.len() + 1);
    allowed.push(organization.id);
    allowed.extend(children.into_iter().map(|child| child.id));

    Ok(allowed)
}
