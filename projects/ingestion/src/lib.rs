//! # Ingestion
//!
//! Service that pulls GitHub issues and recent StackOverflow questions for a
//! configured set of targets, normalizes them and stores them in PostgreSQL.
//! Every run starts from freshly recreated tables; while it runs (and after
//! it finishes) the service exposes its API-call counters on a Prometheus
//! endpoint alongside a pair of placeholder routes.

pub mod config;
pub mod db;
pub mod endpoints;
pub mod extract;
pub mod ingest;
pub mod run;
