pub mod lifecycle_alerts;
pub mod role_repository;
pub mod score_gateway;
pub mod score_sync_queue;
pub mod title_repository;
pub mod user_repository;
