pub mod replay_pending;
