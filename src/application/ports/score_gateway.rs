use async_trait::async_trait;
use uuid::Uuid;

/// Failure modes of a call to the scoring service.
#[derive(thiserror::Error, Debug)]
pub enum ScoreGatewayError {
    /// Connection refused, DNS failure, timeout: the request may or may not
    /// have reached the scoring service.
    #[error("score service unavailable")]
    Unavailable(#[source] anyhow::Error),
    /// The scoring service answered with a non-success status.
    #[error("score service rejected the request with status {status}")]
    Rejected { status: u16, body: String },
}

impl ScoreGatewayError {
    /// Whether replaying the same call later can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScoreGatewayError::Unavailable(_) => true,
            ScoreGatewayError::Rejected { status, .. } => *status >= 500 || *status == 429,
        }
    }
}

/// Network boundary to the scoring service. Implementations make exactly one
/// attempt per call; retries belong to the caller.
#[async_trait]
pub trait ScoreGateway: Send + Sync {
    /// Creates a score record with value 0 for `user_id`.
    async fn initialize_score(&self, user_id: Uuid) -> Result<(), ScoreGatewayError>;
    /// Deletes the score record for `user_id`. A record that does not exist
    /// counts as removed.
    async fn remove_score(&self, user_id: Uuid) -> Result<(), ScoreGatewayError>;
}
