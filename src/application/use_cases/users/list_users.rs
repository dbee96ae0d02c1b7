use uuid::Uuid;

use crate::application::ports::user_repository::UserRepository;
use crate::application::use_cases::users::error::{Entity, UserDirectoryError, storage};
use crate::domain::users::user::{Page, User};

pub struct ListUsers<'a, R: UserRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: UserRepository + ?Sized> ListUsers<'a, R> {
    /// Zero-based page of users. A page without users is reported as not
    /// found rather than returned empty.
    pub async fn execute(&self, page: u32, size: u32) -> Result<Page<User>, UserDirectoryError> {
        let result = self
            .repo
            .list_page(page, size.max(1))
            .await
            .map_err(storage)?;
        if result.items.is_empty() {
            return Err(UserDirectoryError::not_found(Entity::Page, page));
        }
        Ok(result)
    }
}

pub struct ListManagedUsers<'a, R: UserRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: UserRepository + ?Sized> ListManagedUsers<'a, R> {
    pub async fn execute(&self, manager_id: Uuid) -> Result<Vec<User>, UserDirectoryError> {
        self.repo.list_managed_by(manager_id).await.map_err(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::Fixture;

    #[tokio::test]
    async fn pages_are_ordered_by_name() {
        let fx = Fixture::new();
        fx.seed_user("c@example.com", "Cara", "Young").await;
        fx.seed_user("a@example.com", "Ann", "Adams").await;
        fx.seed_user("b@example.com", "Ben", "Moss").await;
        let uc = ListUsers { repo: &fx.users };

        let first = uc.execute(0, 2).await.unwrap();
        assert_eq!(first.total, 3);
        assert_eq!(first.total_pages(), 2);
        let names: Vec<_> = first.items.iter().map(|u| u.last_name.as_str()).collect();
        assert_eq!(names, ["Adams", "Moss"]);

        let second = uc.execute(1, 2).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].last_name, "Young");
    }

    #[tokio::test]
    async fn empty_page_is_not_found() {
        let fx = Fixture::new();
        fx.seed_user("a@example.com", "Ann", "Adams").await;
        let uc = ListUsers { repo: &fx.users };

        let err = uc.execute(5, 10).await.unwrap_err();
        assert!(matches!(
            err,
            UserDirectoryError::NotFound {
                entity: Entity::Page,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn lists_direct_reports_only() {
        use crate::application::ports::user_repository::UserRepository as _;

        let fx = Fixture::new();
        let boss = fx.seed_user("boss@example.com", "Queen", "Hearts").await;
        let report = fx.seed_user("knave@example.com", "Knave", "Hearts").await;
        fx.seed_user("other@example.com", "Other", "Person").await;
        fx.users.set_manager(report.id, boss.id).await.unwrap();

        let managed = ListManagedUsers { repo: &fx.users }
            .execute(boss.id)
            .await
            .unwrap();
        assert_eq!(managed.len(), 1);
        assert_eq!(managed[0].id, report.id);
    }
}
