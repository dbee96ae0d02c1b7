use uuid::Uuid;

use crate::application::ports::title_repository::TitleRepository;
use crate::application::ports::user_repository::{ProfileChanges, UserRepository};
use crate::application::use_cases::users::error::{Entity, UserDirectoryError, storage};
use crate::application::use_cases::users::get_user::require_user;
use crate::domain::users::user::User;

/// Partial profile update; `None` leaves the stored value as is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub manager_id: Option<Uuid>,
    pub title_id: Option<Uuid>,
}

pub struct UpdateUser<'a, U, T>
where
    U: UserRepository + ?Sized,
    T: TitleRepository + ?Sized,
{
    pub users: &'a U,
    pub titles: &'a T,
}

impl<'a, U, T> UpdateUser<'a, U, T>
where
    U: UserRepository + ?Sized,
    T: TitleRepository + ?Sized,
{
    pub async fn execute(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<User, UserDirectoryError> {
        if let Some(manager_id) = update.manager_id {
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
        if let Some(title_id) = update.title_id {
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

        let current = require_user(self.users, id).await?;
        if let Some(email) = &update.email {
            if *email != current.email && self.users.exists_by_email(email).await.map_err(storage)? {
                return Err(UserDirectoryError::Conflict(email.clone()));
            }
        }

        let changes = ProfileChanges {
            email: update.email.clone().unwrap_or(current.email),
            first_name: update.first_name.clone().unwrap_or(current.first_name),
            last_name: update.last_name.clone().unwrap_or(current.last_name),
            phone: update.phone.clone().or(current.phone),
            manager_id: update.manager_id.or(current.manager_id),
            title_id: update.title_id.or(current.title_id),
        };
        let user = self.users.save_profile(id, &changes).await?;
        tracing::info!(user_id = %id, "user_profile_updated");
        Ok(user)
    }
}
