use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOp {
    Initialize,
    Remove,
}

impl ScoreOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreOp::Initialize => "initialize",
            ScoreOp::Remove => "remove",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "initialize" => Some(ScoreOp::Initialize),
            "remove" => Some(ScoreOp::Remove),
            _ => None,
        }
    }
}

impl fmt::Display for ScoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct PendingScoreSync {
    pub id: Uuid,
    pub user_id: Uuid,
    pub op: ScoreOp,
    /// Attempts already made, including the inline one from the request.
    pub attempts: u32,
    pub last_error: Option<String>,
}

/// Durable queue of score calls that failed inline and should be replayed
/// by the background worker.
#[async_trait]
pub trait ScoreSyncQueue: Send + Sync {
    async fn enqueue(
        &self,
        user_id: Uuid,
        op: ScoreOp,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
    /// Claims up to `limit` due items. Claimed items are leased until
    /// `lease_until` so a concurrent worker does not pick them up.
    async fn claim_due(
        &self,
        limit: i64,
        lease_until: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PendingScoreSync>>;
    async fn complete(&self, id: Uuid) -> anyhow::Result<()>;
    async fn reschedule(
        &self,
        id: Uuid,
        attempts: u32,
        next_attempt_at: DateTime<Utc>,
        error: &str,
    ) -> anyhow::Result<()>;
    /// Moves the item out of the active queue into the dead-letter table.
    async fn dead_letter(&self, id: Uuid, attempts: u32, error: &str) -> anyhow::Result<()>;
    /// Drops queued items for `user_id` with the given op. Returns how many
    /// were removed.
    async fn discard_for_user(&self, user_id: Uuid, op: ScoreOp) -> anyhow::Result<u64>;
}
