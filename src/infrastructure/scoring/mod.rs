pub mod score_gateway_reqwest;
pub mod sync_worker;
