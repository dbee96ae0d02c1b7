use anyhow::Context;
use async_trait::async_trait;

use crate::application::ports::lifecycle_alerts::{LifecycleAlert, LifecycleAlerts};
use crate::infrastructure::db::PgPool;

/// Persists alerts for operators and mirrors them to the log at error level.
pub struct SqlxLifecycleAlerts {
    pub pool: PgPool,
}

impl SqlxLifecycleAlerts {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LifecycleAlerts for SqlxLifecycleAlerts {
    async fn raise(&self, alert: &LifecycleAlert) -> anyhow::Result<()> {
        tracing::error!(
            alert = %alert.kind,
            user_id = %alert.user_id,
            detail = %alert.detail,
            "lifecycle_alert"
        );
        sqlx::query("INSERT INTO lifecycle_alerts (kind, user_id, detail) VALUES ($1, $2, $3)")
            .bind(alert.kind.as_str())
            .bind(alert.user_id)
            .bind(&alert.detail)
            .execute(&self.pool)
            .await
            .context("lifecycle_alert_insert")?;
        Ok(())
    }
}
