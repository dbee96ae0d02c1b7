use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::ports::score_gateway::{ScoreGateway, ScoreGatewayError};

/// Wire shape of a score record on the scoring service.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserScore {
    user_id: Uuid,
    score: i64,
}

pub struct ReqwestScoreGateway {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestScoreGateway {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn rejected(resp: reqwest::Response) -> ScoreGatewayError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        ScoreGatewayError::Rejected { status, body }
    }
}

fn unavailable(err: reqwest::Error) -> ScoreGatewayError {
    ScoreGatewayError::Unavailable(anyhow::anyhow!("request failed: {err}"))
}

#[async_trait]
impl ScoreGateway for ReqwestScoreGateway {
    async fn initialize_score(&self, user_id: Uuid) -> Result<(), ScoreGatewayError> {
        let url = format!("{}/add", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&UserScore { user_id, score: 0 })
            .send()
            .await
            .map_err(unavailable)?;
        if !resp.status().is_success() {
            return Err(Self::rejected(resp).await);
        }
        match resp.json::<UserScore>().await {
            Ok(echo) if echo.user_id != user_id => {
                tracing::warn!(user_id = %user_id, echoed = %echo.user_id, "score_init_echo_mismatch");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(user_id = %user_id, error = %err, "score_init_echo_unreadable");
            }
        }
        Ok(())
    }

    async fn remove_score(&self, user_id: Uuid) -> Result<(), ScoreGatewayError> {
        let url = format!("{}/deleteUserScore/{}", self.base_url, user_id);
        let resp = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(unavailable)?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(user_id = %user_id, "score_already_absent");
            return Ok(());
        }
        if !status.is_success() {
            return Err(Self::rejected(resp).await);
        }
        Ok(())
    }
}
