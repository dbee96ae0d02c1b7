use uuid::Uuid;

use crate::application::ports::user_repository::UserRepository;
use crate::application::use_cases::users::error::{Entity, UserDirectoryError, storage};
use crate::domain::users::user::User;

pub(crate) async fn require_user<R: UserRepository + ?Sized>(
    repo: &R,
    id: Uuid,
) -> Result<User, UserDirectoryError> {
    repo.find_by_id(id)
        .await
        .map_err(storage)?
        .ok_or_else(|| UserDirectoryError::not_found(Entity::User, id))
}

pub(crate) async fn require_user_by_email<R: UserRepository + ?Sized>(
    repo: &R,
    email: &str,
) -> Result<User, UserDirectoryError> {
    repo.find_by_email(email)
        .await
        .map_err(storage)?
        .ok_or_else(|| UserDirectoryError::not_found(Entity::User, email))
}

pub struct GetUser<'a, R: UserRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: UserRepository + ?Sized> GetUser<'a, R> {
    pub async fn by_id(&self, id: Uuid) -> Result<User, UserDirectoryError> {
        require_user(self.repo, id).await
    }

    pub async fn by_email(&self, email: &str) -> Result<User, UserDirectoryError> {
        require_user_by_email(self.repo, email).await
    }

    /// Id of the user's manager; a user without one is reported as a missing
    /// manager.
    pub async fn manager_of(&self, id: Uuid) -> Result<Uuid, UserDirectoryError> {
        let user = require_user(self.repo, id).await?;
        user.manager_id
            .ok_or_else(|| UserDirectoryError::not_found(Entity::Manager, format!("of user {id}")))
    }
}
