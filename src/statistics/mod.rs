pub mod metrics;
pub mod profile;
pub mod summary;
pub mod wind;
