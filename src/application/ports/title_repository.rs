use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::users::user::Title;

#[async_trait]
pub trait TitleRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Title>>;
}
