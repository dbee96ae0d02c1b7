pub mod db;
pub mod scoring;
