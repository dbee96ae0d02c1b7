pub mod lifecycle_alerts_sqlx;
pub mod role_repository_sqlx;
pub mod score_sync_queue_sqlx;
pub mod title_repository_sqlx;
pub mod user_repository_sqlx;
