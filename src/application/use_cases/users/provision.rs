use uuid::Uuid;

use crate::application::ports::role_repository::RoleRepository;
use crate::application::ports::title_repository::TitleRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::application::services::credentials;
use crate::application::services::score_sync::ScoreSync;
use crate::application::use_cases::users::error::{Entity, UserDirectoryError, storage};
use crate::domain::users::user::{NewUser, User};

#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub phone: Option<String>,
    pub manager_id: Option<Uuid>,
    pub title_id: Option<Uuid>,
}

/// Creates a user and asks the scoring service to open a score for it.
///
/// Local persistence completes before the remote call. A failing remote call
/// never fails the request and never removes the new user; it is logged and
/// handed to the retry queue by [`ScoreSync::initialize`].
pub struct ProvisionUser<'a, U, R, T>
where
    U: UserRepository + ?Sized,
    R: RoleRepository + ?Sized,
    T: TitleRepository + ?Sized,
{
    pub users: &'a U,
    pub roles: &'a R,
    pub titles: &'a T,
    pub score_sync: ScoreSync<'a>,
    pub default_role: &'a str,
}

impl<'a, U, R, T> ProvisionUser<'a, U, R, T>
where
    U: UserRepository + ?Sized,
    R: RoleRepository + ?Sized,
    T: TitleRepository + ?Sized,
{
    pub async fn execute(&self, req: &ProvisionRequest) -> Result<User, UserDirectoryError> {
        if self
            .users
            .exists_by_email(&req.email)
            .await
            .map_err(storage)?
        {
            return Err(UserDirectoryError::Conflict(req.email.clone()));
        }

        let role = self
            .roles
            .find_by_name(self.default_role)
            .await
            .map_err(storage)?
            .ok_or_else(|| UserDirectoryError::not_found(Entity::Role, self.default_role))?;

        if let Some(manager_id) = req.manager_id {
            if self
                .users
                .find_by_id(manager_id)
                .await
                .map_err(storage)?
                .is_none()
            {
                return Err(UserDirectoryError::not_found(Entity::Manager, manager_id));
            }
        }
        if let Some(title_id) = req.title_id {
            if self
                .titles
                .find_by_id(title_id)
                .await
                .map_err(storage)?
                .is_none()
            {
                return Err(UserDirectoryError::not_found(Entity::Title, title_id));
            }
        }

        let password_hash =
            credentials::hash_password(&req.password).map_err(UserDirectoryError::Credential)?;
        let new = NewUser {
            email: req.email.clone(),
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            password_hash,
            phone: req.phone.clone(),
            manager_id: req.manager_id,
            title_id: req.title_id,
            role_ids: vec![role.id],
        };
        let user = self.users.create_user(&new).await.map_err(|e| {
            let err = UserDirectoryError::from(e);
            if let UserDirectoryError::Storage(inner) = &err {
                tracing::error!(email = %req.email, error = ?inner, "provision_persist_failed");
            }
            err
        })?;
        tracing::info!(user_id = %user.id, "user_provisioned");

        let outcome = self.score_sync.initialize(user.id).await;
        tracing::debug!(user_id = %user.id, ?outcome, "provision_score_sync");

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::score_sync_queue::ScoreOp;
    use crate::application::test_support::{
        Fixture, InMemoryRoles, InMemoryTitles, InMemoryUsers, unavailable, user_role,
    };

    fn request(email: &str) -> ProvisionRequest {
        ProvisionRequest {
            email: email.into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            password: "wonderland".into(),
            phone: Some("+44 20 7946 0000".into()),
            manager_id: None,
            title_id: None,
        }
    }

    fn provision(fx: &Fixture) -> ProvisionUser<'_, InMemoryUsers, InMemoryRoles, InMemoryTitles> {
        ProvisionUser {
            users: &fx.users,
            roles: &fx.roles,
            titles: &fx.titles,
            score_sync: fx.score_sync(),
            default_role: "USER",
        }
    }

    #[tokio::test]
    async fn persists_user_with_default_role_and_hashed_password() {
        let fx = Fixture::new();
        let user = provision(&fx)
            .execute(&request("alice@example.com"))
            .await
            .unwrap();

        assert!(user.has_role(&user_role().name));
        assert_eq!(user.roles.len(), 1);
        assert!(!user.frozen);
        let hash = fx.users.password_hash(user.id).unwrap();
        assert_ne!(hash, "wonderland");
        assert!(credentials::verify_password("wonderland", &hash).unwrap());
        assert_eq!(fx.gateway.calls(), vec![(ScoreOp::Initialize, user.id)]);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_without_remote_call() {
        let fx = Fixture::new();
        fx.seed_user("alice@example.com", "Alice", "Liddell").await;

        let err = provision(&fx)
            .execute(&request("alice@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, UserDirectoryError::Conflict(ref e) if e == "alice@example.com"));
        assert!(fx.gateway.calls().is_empty());
        assert_eq!(fx.users.len(), 1);
    }

    #[tokio::test]
    async fn unique_index_race_maps_to_conflict() {
        let fx = Fixture::new();
        fx.users.lose_email_race();

        let err = provision(&fx)
            .execute(&request("alice@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, UserDirectoryError::Conflict(_)));
        assert!(fx.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_still_returns_success() {
        let fx = Fixture::new();
        fx.gateway.fail_initialize_with(unavailable());

        let user = provision(&fx)
            .execute(&request("alice@example.com"))
            .await
            .unwrap();

        assert!(fx.users.get(user.id).is_some());
        let queued = fx.queue.items();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].user_id, user.id);
        assert_eq!(queued[0].op, ScoreOp::Initialize);
    }

    #[tokio::test]
    async fn storage_failure_aborts_before_remote_call() {
        let fx = Fixture::new();
        fx.users.fail_create();

        let err = provision(&fx)
            .execute(&request("alice@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, UserDirectoryError::Storage(_)));
        assert!(fx.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_default_role_is_not_found() {
        let fx = Fixture::new();
        let uc = ProvisionUser {
            default_role: "EMPLOYEE",
            ..provision(&fx)
        };

        let err = uc.execute(&request("alice@example.com")).await.unwrap_err();

        assert!(matches!(
            err,
            UserDirectoryError::NotFound {
                entity: Entity::Role,
                ..
            }
        ));
        assert_eq!(fx.users.len(), 0);
    }

    #[tokio::test]
    async fn resolves_manager_and_title() {
        let fx = Fixture::new();
        let boss = fx.seed_user("boss@example.com", "Mad", "Hatter").await;
        let title = fx.titles.add("Engineer");
        let req = ProvisionRequest {
            manager_id: Some(boss.id),
            title_id: Some(title.id),
            ..request("alice@example.com")
        };

        let user = provision(&fx).execute(&req).await.unwrap();

        assert_eq!(user.manager_id, Some(boss.id));
        assert_eq!(user.title_id, Some(title.id));
    }

    #[tokio::test]
    async fn unknown_manager_or_title_is_not_found() {
        let fx = Fixture::new();
        let missing_manager = ProvisionRequest {
            manager_id: Some(Uuid::new_v4()),
            ..request("alice@example.com")
        };
        let err = provision(&fx).execute(&missing_manager).await.unwrap_err();
        assert!(matches!(
            err,
            UserDirectoryError::NotFound {
                entity: Entity::Manager,
                ..
            }
        ));

        let missing_title = ProvisionRequest {
            title_id: Some(Uuid::new_v4()),
            ..request("alice@example.com")
        };
        let err = provision(&fx).execute(&missing_title).await.unwrap_err();
        assert!(matches!(
            err,
            UserDirectoryError::NotFound {
                entity: Entity::Title,
                ..
            }
        ));
        assert_eq!(fx.users.len(), 0);
        assert!(fx.gateway.calls().is_empty());
    }
}
