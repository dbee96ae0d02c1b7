use uuid::Uuid;

use crate::application::ports::role_repository::RoleRepository;
use crate::application::ports::title_repository::TitleRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::application::use_cases::users::error::{Entity, UserDirectoryError, storage};
use crate::application::use_cases::users::get_user::{require_user, require_user_by_email};
use crate::domain::users::user::User;

pub struct AssignManager<'a, U: UserRepository + ?Sized> {
    pub users: &'a U,
}

impl<'a, U: UserRepository + ?Sized> AssignManager<'a, U> {
    pub async fn execute(
        &self,
        user_email: &str,
        manager_email: &str,
    ) -> Result<(), UserDirectoryError> {
        let user = require_user_by_email(self.users, user_email).await?;
        let manager = self
            .users
            .find_by_email(manager_email)
            .await
            .map_err(storage)?
            .ok_or_else(|| UserDirectoryError::not_found(Entity::Manager, manager_email))?;
        if !self
            .users
            .set_manager(user.id, manager.id)
            .await
            .map_err(storage)?
        {
            return Err(UserDirectoryError::not_found(Entity::User, user_email));
        }
        tracing::info!(user_id = %user.id, manager_id = %manager.id, "manager_assigned");
        Ok(())
    }
}

pub struct AssignTitle<'a, U, T>
where
    U: UserRepository + ?Sized,
    T: TitleRepository + ?Sized,
{
    pub users: &'a U,
    pub titles: &'a T,
}

impl<'a, U, T> AssignTitle<'a, U, T>
where
    U: UserRepository + ?Sized,
    T: TitleRepository + ?Sized,
{
    pub async fn execute(&self, email: &str, title_id: Uuid) -> Result<(), UserDirectoryError> {
        let user = require_user_by_email(self.users, email).await?;
        let title = self
            .titles
            .find_by_id(title_id)
            .await
            .map_err(storage)?
            .ok_or_else(|| UserDirectoryError::not_found(Entity::Title, title_id))?;
        if !self
            .users
            .set_title(user.id, title.id)
            .await
            .map_err(storage)?
        {
            return Err(UserDirectoryError::not_found(Entity::User, email));
        }
        tracing::info!(user_id = %user.id, title_id = %title.id, "title_assigned");
        Ok(())
    }
}

/// Adds a role to the user's role set. Roles already held stay; nothing is
/// replaced.
pub struct AssignRole<'a, U, R>
where
    U: UserRepository + ?Sized,
    R: RoleRepository + ?Sized,
{
    pub users: &'a U,
    pub roles: &'a R,
}

impl<'a, U, R> AssignRole<'a, U, R>
where
    U: UserRepository + ?Sized,
    R: RoleRepository + ?Sized,
{
    pub async fn execute(&self, email: &str, role_id: i64) -> Result<User, UserDirectoryError> {
        let user = require_user_by_email(self.users, email).await?;
        let role = self
            .roles
            .find_by_id(role_id)
            .await
            .map_err(storage)?
            .ok_or_else(|| UserDirectoryError::not_found(Entity::Role, role_id))?;
        self.users
            .add_role(user.id, role.id)
            .await
            .map_err(storage)?;
        tracing::info!(user_id = %user.id, role = %role.name, "role_assigned");
        require_user(self.users, user.id).await
    }
}
