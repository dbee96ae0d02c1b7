use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::application::ports::title_repository::TitleRepository;
use crate::domain::users::user::Title;
use crate::infrastructure::db::PgPool;

pub struct SqlxTitleRepository {
    pub pool: PgPool,
}

impl SqlxTitleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TitleRepository for SqlxTitleRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Title>> {
        let row = sqlx::query("SELECT id, name FROM titles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Title {
            id: r.get("id"),
            name: r.get("name"),
        }))
    }
}
