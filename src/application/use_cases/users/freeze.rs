use crate::application::ports::user_repository::UserRepository;
use crate::application::use_cases::users::error::{Entity, UserDirectoryError, storage};
use crate::application::use_cases::users::get_user::{require_user, require_user_by_email};
use crate::domain::users::user::User;

/// Sets or clears the frozen flag. No other column is written.
pub struct SetFrozen<'a, U: UserRepository + ?Sized> {
    pub users: &'a U,
}

impl<'a, U: UserRepository + ?Sized> SetFrozen<'a, U> {
    pub async fn freeze(&self, email: &str) -> Result<User, UserDirectoryError> {
        self.apply(email, true).await
    }

    pub async fn unfreeze(&self, email: &str) -> Result<User, UserDirectoryError> {
        self.apply(email, false).await
    }

    async fn apply(&self, email: &str, frozen: bool) -> Result<User, UserDirectoryError> {
        let user = require_user_by_email(self.users, email).await?;
        if !self
            .users
            .set_frozen(user.id, frozen)
            .await
            .map_err(storage)?
        {
            return Err(UserDirectoryError::not_found(Entity::User, email));
        }
        tracing::info!(user_id = %user.id, frozen, "user_frozen_flag_set");
        require_user(self.users, user.id).await
    }
}
