use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::users::user::{NewUser, Page, User};

#[derive(Debug, Clone)]
pub struct UserCredential {
    pub user: User,
    pub password_hash: String,
}

/// Profile columns written by `save_profile`. Password, frozen flag and
/// roles have dedicated mutations.
#[derive(Debug, Clone)]
pub struct ProfileChanges {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub manager_id: Option<Uuid>,
    pub title_id: Option<Uuid>,
}

#[derive(thiserror::Error, Debug)]
pub enum UserStoreError {
    #[error("email {0} is already taken")]
    EmailTaken(String),
    #[error("user store failure")]
    Backend(#[source] anyhow::Error),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<User, UserStoreError>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_credential_by_email(&self, email: &str)
    -> anyhow::Result<Option<UserCredential>>;
    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool>;
    async fn list_page(&self, page: u32, size: u32) -> anyhow::Result<Page<User>>;
    async fn list_managed_by(&self, manager_id: Uuid) -> anyhow::Result<Vec<User>>;
    async fn save_profile(&self, id: Uuid, changes: &ProfileChanges)
    -> Result<User, UserStoreError>;
    async fn set_frozen(&self, id: Uuid, frozen: bool) -> anyhow::Result<bool>;
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool>;
    async fn set_manager(&self, id: Uuid, manager_id: Uuid) -> anyhow::Result<bool>;
    async fn set_title(&self, id: Uuid, title_id: Uuid) -> anyhow::Result<bool>;
    /// Adds `role_id` to the user's role set; a role already held is a no-op.
    async fn add_role(&self, id: Uuid, role_id: i64) -> anyhow::Result<()>;
    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool>;
}
