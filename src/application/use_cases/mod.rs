pub mod score_sync;
pub mod users;
