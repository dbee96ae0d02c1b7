use crate::application::ports::user_repository::UserRepository;
use crate::application::services::credentials;
use crate::application::use_cases::users::error::{Entity, UserDirectoryError, storage};
use crate::application::use_cases::users::get_user::require_user_by_email;

pub struct ResetPassword<'a, U: UserRepository + ?Sized> {
    pub users: &'a U,
}

impl<'a, U: UserRepository + ?Sized> ResetPassword<'a, U> {
    pub async fn execute(&self, email: &str, new_password: &str) -> Result<(), UserDirectoryError> {
        let user = require_user_by_email(self.users, email).await?;
        let hash =
            credentials::hash_password(new_password).map_err(UserDirectoryError::Credential)?;
        if !self
            .users
            .set_password_hash(user.id, &hash)
            .await
            .map_err(storage)?
        {
            return Err(UserDirectoryError::not_found(Entity::User, email));
        }
        tracing::info!(user_id = %user.id, "password_reset");
        Ok(())
    }
}
