use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::application::ports::score_sync_queue::{PendingScoreSync, ScoreOp, ScoreSyncQueue};
use crate::infrastructure::db::PgPool;

pub struct SqlxScoreSyncQueue {
    pub pool: PgPool,
}

impl SqlxScoreSyncQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScoreSyncQueue for SqlxScoreSyncQueue {
    async fn enqueue(
        &self,
        user_id: Uuid,
        op: ScoreOp,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"INSERT INTO score_sync_queue (user_id, op, attempts, last_error, next_attempt_at)
               VALUES ($1, $2, 1, $3, $4)"#,
        )
        .bind(user_id)
        .bind(op.as_str())
        .bind(error)
        .bind(next_attempt_at)
        .execute(&self.pool)
        .await
        .context("score_sync_enqueue")?;
        Ok(())
    }

    async fn claim_due(
        &self,
        limit: i64,
        lease_until: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PendingScoreSync>> {
        let rows = sqlx::query(
            r#"UPDATE score_sync_queue q
               SET next_attempt_at = $2
               WHERE q.id IN (
                   SELECT id FROM score_sync_queue
                   WHERE next_attempt_at <= now()
                   ORDER BY next_attempt_at
                   LIMIT $1
                   FOR UPDATE SKIP LOCKED
               )
               RETURNING q.id, q.user_id, q.op, q.attempts, q.last_error"#,
        )
        .bind(limit)
        .bind(lease_until)
        .fetch_all(&self.pool)
        .await
        .context("score_sync_claim_due")?;

        let mut items = Vec::with_capacity(rows.len());
        for r in rows {
            let op: String = r.get("op");
            let id: Uuid = r.get("id");
            let Some(op) = ScoreOp::parse(&op) else {
                tracing::error!(item_id = %id, op = %op, "score_sync_unknown_op");
                continue;
            };
            let attempts: i32 = r.get("attempts");
            items.push(PendingScoreSync {
                id,
                user_id: r.get("user_id"),
                op,
                attempts: attempts.max(0) as u32,
                last_error: r.get("last_error"),
            });
        }
        Ok(items)
    }

    async fn complete(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM score_sync_queue WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("score_sync_complete")?;
        Ok(())
    }

    async fn reschedule(
        &self,
        id: Uuid,
        attempts: u32,
        next_attempt_at: DateTime<Utc>,
        error: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"UPDATE score_sync_queue
               SET attempts = $2, next_attempt_at = $3, last_error = $4, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(attempts as i32)
        .bind(next_attempt_at)
        .bind(error)
        .execute(&self.pool)
        .await
        .context("score_sync_reschedule")?;
        Ok(())
    }

    async fn dead_letter(&self, id: Uuid, attempts: u32, error: &str) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"INSERT INTO score_sync_dead_letters (id, user_id, op, attempts, last_error, enqueued_at)
               SELECT id, user_id, op, $2, $3, created_at FROM score_sync_queue WHERE id = $1"#,
        )
        .bind(id)
        .bind(attempts as i32)
        .bind(error)
        .execute(&mut *tx)
        .await
        .context("score_sync_dead_letter_insert")?;
        sqlx::query("DELETE FROM score_sync_queue WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("score_sync_dead_letter_delete")?;
        tx.commit().await?;
        Ok(())
    }

    async fn discard_for_user(&self, user_id: Uuid, op: ScoreOp) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM score_sync_queue WHERE user_id = $1 AND op = $2")
            .bind(user_id)
            .bind(op.as_str())
            .execute(&self.pool)
            .await
            .context("score_sync_discard")?;
        Ok(res.rows_affected())
    }
}
