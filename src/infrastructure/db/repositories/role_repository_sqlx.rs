use async_trait::async_trait;
use sqlx::Row;

use crate::application::ports::role_repository::RoleRepository;
use crate::domain::users::user::Role;
use crate::infrastructure::db::PgPool;

pub struct SqlxRoleRepository {
    pub pool: PgPool,
}

impl SqlxRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for SqlxRoleRepository {
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Role>> {
        let row = sqlx::query("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Role {
            id: r.get("id"),
            name: r.get("name"),
        }))
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Role>> {
        let row = sqlx::query("SELECT id, name FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Role {
            id: r.get("id"),
            name: r.get("name"),
        }))
    }
}
