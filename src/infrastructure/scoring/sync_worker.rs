use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::application::ports::lifecycle_alerts::LifecycleAlerts;
use crate::application::ports::score_gateway::ScoreGateway;
use crate::application::ports::score_sync_queue::ScoreSyncQueue;
use crate::application::ports::user_repository::UserRepository;
use crate::application::services::score_sync::ScoreRetryPolicy;
use crate::application::use_cases::score_sync::replay_pending::ReplayPendingScoreSyncs;

#[derive(Debug, Clone)]
pub struct ScoreSyncWorkerConfig {
    pub poll_interval: Duration,
    pub batch_size: i64,
    pub lease: Duration,
}

/// Background task draining the score sync queue. Runs independently of the
/// request handlers and stops when the shutdown channel flips to `true`.
pub struct ScoreSyncWorker {
    pub users: Arc<dyn UserRepository>,
    pub gateway: Arc<dyn ScoreGateway>,
    pub queue: Arc<dyn ScoreSyncQueue>,
    pub alerts: Arc<dyn LifecycleAlerts>,
    pub retry: ScoreRetryPolicy,
    pub config: ScoreSyncWorkerConfig,
}

impl ScoreSyncWorker {
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                poll_interval_ms = self.config.poll_interval.as_millis() as u64,
                batch_size = self.config.batch_size,
                max_attempts = self.retry.max_attempts,
                "score_sync_worker_started"
            );
            let mut ticker = tokio::time::interval(self.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => self.run_once().await,
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("score_sync_worker_stopped");
        })
    }

    async fn run_once(&self) {
        let uc = ReplayPendingScoreSyncs {
            users: self.users.as_ref(),
            gateway: self.gateway.as_ref(),
            queue: self.queue.as_ref(),
            alerts: self.alerts.as_ref(),
            retry: &self.retry,
            batch_size: self.config.batch_size,
            lease: self.config.lease,
        };
        match uc.execute().await {
            Ok(report) if report.processed() > 0 => {
                tracing::info!(
                    synced = report.synced,
                    skipped = report.skipped,
                    rescheduled = report.rescheduled,
                    dead_lettered = report.dead_lettered,
                    "score_sync_pass"
                );
            }
            Ok(_) => {}
            Err(err) => tracing::error!(error = ?err, "score_sync_pass_failed"),
        }
    }
}
