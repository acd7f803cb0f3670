pub mod github;
pub mod metrics;
pub mod stackoverflow;
