//! Fetch-and-normalize pipelines, one per upstream source.

pub mod github;
pub mod stackexchange;
