use uuid::Uuid;

use crate::application::ports::lifecycle_alerts::{AlertKind, LifecycleAlert};
use crate::application::ports::score_sync_queue::ScoreOp;
use crate::application::ports::user_repository::UserRepository;
use crate::application::services::score_sync::{DeprovisionPolicy, ScoreSync};
use crate::application::use_cases::users::error::{Entity, UserDirectoryError};
use crate::application::use_cases::users::get_user::{require_user, require_user_by_email};

/// Deletes a user after removing its remote score record.
///
/// The remote removal runs first. Under [`DeprovisionPolicy::Strict`] a
/// failed removal leaves the local user untouched and the gateway error is
/// returned; under `BestEffort` the failure is logged and queued and the
/// local delete goes ahead.
pub struct DeprovisionUser<'a, U: UserRepository + ?Sized> {
    pub users: &'a U,
    pub score_sync: ScoreSync<'a>,
    pub policy: DeprovisionPolicy,
}

impl<'a, U: UserRepository + ?Sized> DeprovisionUser<'a, U> {
    pub async fn execute(&self, user_id: Uuid) -> Result<(), UserDirectoryError> {
        require_user(self.users, user_id).await?;

        self.score_sync.remove(user_id, self.policy).await?;

        match self.users.delete_user(user_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(user_id = %user_id, "deprovision_user_vanished");
                return Err(UserDirectoryError::not_found(Entity::User, user_id));
            }
            Err(err) => {
                tracing::error!(
                    user_id = %user_id,
                    error = ?err,
                    "deprovision_local_delete_failed_after_score_removal"
                );
                let alert = LifecycleAlert {
                    kind: AlertKind::LocalDeleteFailedAfterScoreRemoval,
                    user_id,
                    detail: format!("{err:#}"),
                };
                if let Err(alert_err) = self.score_sync.alerts.raise(&alert).await {
                    tracing::error!(user_id = %user_id, error = ?alert_err, "lifecycle_alert_failed");
                }
                return Err(UserDirectoryError::Storage(err));
            }
        }

        match self
            .score_sync
            .queue
            .discard_for_user(user_id, ScoreOp::Initialize)
            .await
        {
            Ok(0) => {}
            Ok(n) => tracing::info!(user_id = %user_id, discarded = n, "pending_score_init_discarded"),
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = ?err, "pending_score_init_discard_failed")
            }
        }

        tracing::info!(user_id = %user_id, "user_deprovisioned");
        Ok(())
    }

    pub async fn execute_by_email(&self, email: &str) -> Result<(), UserDirectoryError> {
        let user = require_user_by_email(self.users, email).await?;
        self.execute(user.id).await
    }
}
