pub mod credentials;
pub mod score_sync;
