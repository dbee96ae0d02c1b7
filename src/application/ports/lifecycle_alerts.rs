use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Remote score removed but the local user row could not be deleted.
    LocalDeleteFailedAfterScoreRemoval,
    /// A queued score call exhausted its attempts or failed permanently.
    ScoreSyncDeadLettered,
    /// The inline score call failed and could not be queued either.
    ScoreSyncNotQueued,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::LocalDeleteFailedAfterScoreRemoval => {
                "local_delete_failed_after_score_removal"
            }
            AlertKind::ScoreSyncDeadLettered => "score_sync_dead_lettered",
            AlertKind::ScoreSyncNotQueued => "score_sync_not_queued",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct LifecycleAlert {
    pub kind: AlertKind,
    pub user_id: Uuid,
    pub detail: String,
}

/// Operator-visible channel for lifecycle inconsistencies that need manual
/// reconciliation.
#[async_trait]
pub trait LifecycleAlerts: Send + Sync {
    async fn raise(&self, alert: &LifecycleAlert) -> anyhow::Result<()>;
}
