//! Failure-isolation policy around the score gateway.
//!
//! Provisioning treats the remote score call as fire-and-forget: a failure is
//! logged and, when retries are enabled, queued for the background worker.
//! Deprovisioning either blocks on the remote failure (`Strict`) or logs,
//! queues and carries on (`BestEffort`).

use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::application::ports::lifecycle_alerts::{AlertKind, LifecycleAlert, LifecycleAlerts};
use crate::application::ports::score_gateway::{ScoreGateway, ScoreGatewayError};
use crate::application::ports::score_sync_queue::{ScoreOp, ScoreSyncQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeprovisionPolicy {
    /// A failed remote removal aborts the deprovisioning request.
    #[default]
    Strict,
    /// A failed remote removal is logged and queued; the local delete
    /// proceeds.
    BestEffort,
}

impl DeprovisionPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(DeprovisionPolicy::Strict),
            "best_effort" | "best-effort" => Some(DeprovisionPolicy::BestEffort),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoreRetryPolicy {
    pub enabled: bool,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ScoreRetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(300),
            max_attempts: 8,
        }
    }
}

impl ScoreRetryPolicy {
    /// Delay before the next attempt once `attempts` attempts have failed:
    /// `base * 2^(attempts - 1)`, capped at `max_delay`.
    pub fn backoff(&self, attempts: u32) -> Duration {
        let exp = attempts.saturating_sub(1);
        let factor = 1u32.checked_shl(exp).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub fn next_attempt_at(&self, attempts: u32) -> DateTime<Utc> {
        let delay = chrono::Duration::from_std(self.backoff(attempts))
            .unwrap_or_else(|_| chrono::Duration::seconds(self.max_delay.as_secs() as i64));
        Utc::now() + delay
    }

    pub fn exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSyncOutcome {
    Synced,
    /// The call failed and was queued for the retry worker.
    Queued,
    /// The call failed and was only logged.
    Dropped,
}

pub struct ScoreSync<'a> {
    pub gateway: &'a dyn ScoreGateway,
    pub queue: &'a dyn ScoreSyncQueue,
    pub alerts: &'a dyn LifecycleAlerts,
    pub retry: &'a ScoreRetryPolicy,
}

impl ScoreSync<'_> {
    /// Never fails: the caller's provisioning request must succeed once the
    /// user row is persisted.
    pub async fn initialize(&self, user_id: Uuid) -> ScoreSyncOutcome {
        match self.gateway.initialize_score(user_id).await {
            Ok(()) => {
                tracing::debug!(user_id = %user_id, "score_initialized");
                ScoreSyncOutcome::Synced
            }
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = ?err, "score_init_failed");
                self.defer(user_id, ScoreOp::Initialize, &err).await
            }
        }
    }

    pub async fn remove(
        &self,
        user_id: Uuid,
        policy: DeprovisionPolicy,
    ) -> Result<ScoreSyncOutcome, ScoreGatewayError> {
        match self.gateway.remove_score(user_id).await {
            Ok(()) => {
                tracing::debug!(user_id = %user_id, "score_removed");
                Ok(ScoreSyncOutcome::Synced)
            }
            Err(err) => match policy {
                DeprovisionPolicy::Strict => {
                    tracing::warn!(user_id = %user_id, error = ?err, "score_remove_failed_aborting");
                    Err(err)
                }
                DeprovisionPolicy::BestEffort => {
                    tracing::warn!(user_id = %user_id, error = ?err, "score_remove_failed_continuing");
                    Ok(self.defer(user_id, ScoreOp::Remove, &err).await)
                }
            },
        }
    }

    async fn defer(&self, user_id: Uuid, op: ScoreOp, err: &ScoreGatewayError) -> ScoreSyncOutcome {
        if !self.retry.enabled || !err.is_retryable() {
            return ScoreSyncOutcome::Dropped;
        }
        let message = format!("{err:#}");
        match self
            .queue
            .enqueue(user_id, op, &message, self.retry.next_attempt_at(1))
            .await
        {
            Ok(()) => {
                tracing::info!(user_id = %user_id, op = %op, "score_sync_queued");
                ScoreSyncOutcome::Queued
            }
            Err(queue_err) => {
                tracing::error!(user_id = %user_id, op = %op, error = ?queue_err, "score_sync_enqueue_failed");
                let alert = LifecycleAlert {
                    kind: AlertKind::ScoreSyncNotQueued,
                    user_id,
                    detail: format!("{op} failed ({message}) and could not be queued: {queue_err:#}"),
                };
                if let Err(alert_err) = self.alerts.raise(&alert).await {
                    tracing::error!(user_id = %user_id, error = ?alert_err, "lifecycle_alert_failed");
                }
                ScoreSyncOutcome::Dropped
            }
        }
    }
}
