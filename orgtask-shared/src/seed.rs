//! Demo data
//!
//! Loads a small fixed dataset: Acme Corp with one child team, an unrelated
//! side project, six users and six tasks. Every row is looked up before it is
//! inserted, so running the seed twice changes nothing. All seeded users share
//! the password [`SEED_PASSWORD`].

use tracing::info;

use crate::auth::password::hash_password;
use crate::models::organization::{CreateOrganization, Organization, OrganizationType};
use crate::models::task::{CreateTask, TaskCategory, TaskStatus};
use crate::models::user::{CreateUser, Role, User};
use crate::services::error::ServiceResult;
use crate::store::Store;

pub const SEED_PASSWORD: &str = "SeedPassword123";

/// Rows inserted by one seed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub organizations: usize,
    pub users: usize,
    pub tasks: usize,
}

struct Seeder<'a, S: Store + ?Sized> {
    store: &'a S,
    password_hash: String,
    report: SeedReport,
}

impl<'a, S: Store + ?Sized> Seeder<'a, S> {
    async fn organization(
        &mut self,
        name: &str,
        org_type: OrganizationType,
        parent: Option<&Organization>,
    ) -> ServiceResult<Organization> {
        if let Some(existing) = self.store.find_organization_by_name(name).await? {
            return Ok(existing);
        }

        let organization = self
            .store
            .create_organization(CreateOrganization {
                name: name.to_string(),
                org_type,
                parent_id: parent.map(|p| p.id),
            })
            .await?;
        self.report.organizations += 1;
        Ok(organization)
    }

    async fn user(&mut self, email: &str, role: Role, organization: &Organization) -> ServiceResult<User> {
        if let Some(existing) = self.store.find_user_by_email(email).await? {
            return Ok(existing);
        }

        let user = self
            .store
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: self.password_hash.clone(),
                role,
                organization_id: organization.id,
            })
            .await?;
        self.report.users += 1;
        Ok(user)
    }

    async fn task(
        &mut self,
        title: &str,
        description: Option<&str>,
        category: TaskCategory,
        status: TaskStatus,
        owner: &User,
    ) -> ServiceResult<()> {
        let existing = self.store.list_tasks(&[owner.organization_id]).await?;
        if existing.iter().any(|t| t.title == title && t.owner_id == owner.id) {
            return Ok(());
        }

        self.store
            .create_task(CreateTask {
                organization_id: owner.organization_id,
                owner_id: owner.id,
                title: title.to_string(),
                description: description.map(str::to_string),
                category,
                status,
            })
            .await?;
        self.report.tasks += 1;
        Ok(())
    }
}

/// Inserts whatever part of the demo dataset is missing
pub async fn seed_demo_data<S: Store + ?Sized>(store: &S) -> ServiceResult<SeedReport> {
    let mut seeder = Seeder {
        store,
        password_hash: hash_password(SEED_PASSWORD)?,
        report: SeedReport::default(),
    };

    let acme = seeder.organization("Acme Corp", OrganizationType::Company, None).await?;
    let acme_team = seeder
        .organization("Acme Engineering", OrganizationType::Team, Some(&acme))
        .await?;
    let side = seeder
        .organization("Side Project Alpha", OrganizationType::Project, None)
        .await?;

    let owner_acme = seeder.user("owner@acme.com", Role::Owner, &acme).await?;
    let admin_acme = seeder.user("admin@acme.com", Role::Admin, &acme).await?;
    let viewer_acme = seeder.user("viewer@acme.com", Role::Viewer, &acme).await?;
    seeder.user("admin@acme-team.com", Role::Admin, &acme_team).await?;
    seeder.user("viewer@acme-team.com", Role::Viewer, &acme_team).await?;
    let owner_side = seeder.user("owner@side.com", Role::Owner, &side).await?;

    seeder
        .task(
            "Setup CI/CD",
            Some("Configure pipeline for main app"),
            TaskCategory::Work,
            TaskStatus::InProgress,
            &owner_acme,
        )
        .await?;
    seeder
        .task(
            "Review Q4 goals",
            Some("Align team on objectives"),
            TaskCategory::Work,
            TaskStatus::Todo,
            &admin_acme,
        )
        .await?;
    seeder
        .task("Read API docs", None, TaskCategory::Work, TaskStatus::Todo, &viewer_acme)
        .await?;
    seeder
        .task(
            "Deploy staging",
            Some("Deploy to staging environment"),
            TaskCategory::Work,
            TaskStatus::Completed,
            &owner_acme,
        )
        .await?;
    seeder
        .task(
            "Personal learning",
            Some("Rust and sqlx"),
            TaskCategory::Personal,
            TaskStatus::InProgress,
            &owner_side,
        )
        .await?;
    seeder
        .task("Misc task", None, TaskCategory::Other, TaskStatus::Todo, &owner_side)
        .await?;

    let report = seeder.report;
    info!(
        organizations = report.organizations,
        users = report.users,
        tasks = report.tasks,
        "Demo data seeded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, OrganizationStore, TaskStore, UserStore};

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryStore::new();

        let first = seed_demo_data(&store).await.unwrap();
        assert_eq!(
            first,
            SeedReport {
                organizations: 3,
                users: 6,
                tasks: 6
            }
        );

        let second = seed_demo_data(&store).await.unwrap();
        assert_eq!(second, SeedReport::default());
    }

    #[tokio::test]
    async fn test_seed_hierarchy() {
        let store = MemoryStore::new();
        seed_demo_data(&store).await.unwrap();

        let acme = store.find_organization_by_name("Acme Corp").await.unwrap().unwrap();
        let team = store.find_organization_by_name("Acme Engineering").await.unwrap().unwrap();
        let side = store.find_organization_by_name("Side Project Alpha").await.unwrap().unwrap();

        assert!(acme.is_root());
        assert_eq!(team.parent_id, Some(acme.id));
        assert!(side.is_root());

        let viewer = store.find_user_by_email("viewer@acme-team.com").await.unwrap().unwrap();
        assert_eq!(viewer.organization_id, team.id);
        assert_eq!(viewer.role, Role::Viewer);

        assert_eq!(store.list_tasks(&[acme.id]).await.unwrap().len(), 4);
        assert_eq!(store.list_tasks(&[side.id]).await.unwrap().len(), 2);
        assert!(store.list_tasks(&[team.id]).await.unwrap().is_empty());
    }
}
