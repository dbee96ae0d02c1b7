use async_trait::async_trait;

use crate::domain::users::user::Role;

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Role>>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Role>>;
}
