use std::time::Duration;

use chrono::Utc;

use crate::application::ports::lifecycle_alerts::{AlertKind, LifecycleAlert, LifecycleAlerts};
use crate::application::ports::score_gateway::ScoreGateway;
use crate::application::ports::score_sync_queue::{PendingScoreSync, ScoreOp, ScoreSyncQueue};
use crate::application::ports::user_repository::UserRepository;
use crate::application::services::score_sync::ScoreRetryPolicy;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    pub synced: usize,
    pub skipped: usize,
    pub rescheduled: usize,
    pub dead_lettered: usize,
}

impl ReplayReport {
    pub fn processed(&self) -> usize {
        self.synced + self.skipped + self.rescheduled + self.dead_lettered
    }
}

/// One pass of the score sync worker: claims due queue items and replays
/// their gateway call.
pub struct ReplayPendingScoreSyncs<'a, U: UserRepository + ?Sized> {
    pub users: &'a U,
    pub gateway: &'a dyn ScoreGateway,
    pub queue: &'a dyn ScoreSyncQueue,
    pub alerts: &'a dyn LifecycleAlerts,
    pub retry: &'a ScoreRetryPolicy,
    pub batch_size: i64,
    /// How long a claimed item stays invisible to other workers.
    pub lease: Duration,
}

impl<'a, U: UserRepository + ?Sized> ReplayPendingScoreSyncs<'a, U> {
    pub async fn execute(&self) -> anyhow::Result<ReplayReport> {
        let lease = chrono::Duration::from_std(self.lease)?;
        let items = self
            .queue
            .claim_due(self.batch_size, Utc::now() + lease)
            .await?;
        let mut report = ReplayReport::default();
        for item in items {
            match self.replay(&item).await {
                Ok(Replayed::Synced) => report.synced += 1,
                Ok(Replayed::Skipped) => report.skipped += 1,
                Ok(Replayed::Rescheduled) => report.rescheduled += 1,
                Ok(Replayed::DeadLettered) => report.dead_lettered += 1,
                Err(err) => {
                    tracing::error!(item_id = %item.id, user_id = %item.user_id, error = ?err, "score_sync_replay_failed");
                }
            }
        }
        Ok(report)
    }

    async fn replay(&self, item: &PendingScoreSync) -> anyhow::Result<Replayed> {
        if item.op == ScoreOp::Initialize && self.users.find_by_id(item.user_id).await?.is_none() {
            tracing::info!(user_id = %item.user_id, "score_init_skipped_user_gone");
            self.queue.complete(item.id).await?;
            return Ok(Replayed::Skipped);
        }

        let result = match item.op {
            ScoreOp::Initialize => self.gateway.initialize_score(item.user_id).await,
            ScoreOp::Remove => self.gateway.remove_score(item.user_id).await,
        };
        let err = match result {
            Ok(()) => {
                if item.op == ScoreOp::Initialize
                    && self.users.find_by_id(item.user_id).await?.is_none()
                {
                    self.undo_orphaned_init(item).await?;
                    return Ok(Replayed::Skipped);
                }
                tracing::info!(user_id = %item.user_id, op = %item.op, attempts = item.attempts + 1, "score_sync_replayed");
                self.queue.complete(item.id).await?;
                return Ok(Replayed::Synced);
            }
            Err(err) => err,
        };

        let attempts = item.attempts + 1;
        let message = format!("{err:#}");
        if err.is_retryable() && !self.retry.exhausted(attempts) {
            tracing::warn!(user_id = %item.user_id, op = %item.op, attempts, error = %message, "score_sync_retry_scheduled");
            self.queue
                .reschedule(item.id, attempts, self.retry.next_attempt_at(attempts), &message)
                .await?;
            return Ok(Replayed::Rescheduled);
        }

        tracing::error!(user_id = %item.user_id, op = %item.op, attempts, error = %message, "score_sync_dead_lettered");
        self.queue.dead_letter(item.id, attempts, &message).await?;
        let alert = LifecycleAlert {
            kind: AlertKind::ScoreSyncDeadLettered,
            user_id: item.user_id,
            detail: format!("{} gave up after {attempts} attempts: {message}", item.op),
        };
        if let Err(alert_err) = self.alerts.raise(&alert).await {
            tracing::error!(user_id = %item.user_id, error = ?alert_err, "lifecycle_alert_failed");
        }
        Ok(Replayed::DeadLettered)
    }

    /// The user was deprovisioned while its init was in flight: take the
    /// fresh score back out, or queue the removal if that fails.
    async fn undo_orphaned_init(&self, item: &PendingScoreSync) -> anyhow::Result<()> {
        tracing::warn!(user_id = %item.user_id, "score_init_raced_deprovision");
        if let Err(err) = self.gateway.remove_score(item.user_id).await {
            let message = format!("{err:#}");
            tracing::warn!(user_id = %item.user_id, error = %message, "score_orphan_remove_failed");
            self.queue
                .enqueue(
                    item.user_id,
                    ScoreOp::Remove,
                    &message,
                    self.retry.next_attempt_at(1),
                )
                .await?;
        }
        self.queue.complete(item.id).await?;
        Ok(())
    }
}

enum Replayed {
    Synced,
    Skipped,
    Rescheduled,
    DeadLettered,
}
