//! API-call counters shared between the ingestion path and the metrics
//! endpoint.
//!
//! One [`ApiCallMetrics`] is built at process start and handed to both
//! fetch paths by reference; the metrics endpoint renders it with
//! [`ApiCallMetrics::prometheus_export`]. Counters only ever go up.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters for outbound API calls.
#[derive(Debug, Default)]
pub struct ApiCallMetrics {
    /// Total number of GitHub API calls.
    pub github_api_calls: AtomicU64,

    /// Total number of StackOverflow API calls.
    pub stackoverflow_api_calls: AtomicU64,
}

impl ApiCallMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed GitHub fetch.
    pub fn record_github_call(&self) {
        self.github_api_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one completed StackOverflow fetch.
    pub fn record_stackoverflow_call(&self) {
        self.stackoverflow_api_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current counter values.
    pub fn snapshot(&self) -> ApiCallSnapshot {
        ApiCallSnapshot {
            github_api_calls: self.github_api_calls.load(Ordering::Relaxed),
            stackoverflow_api_calls: self.stackoverflow_api_calls.load(Ordering::Relaxed),
        }
    }

    /// Export counters in Prometheus text format.
    pub fn prometheus_export(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            "# HELP github_api_calls_total Total number of GitHub API calls\n\
             # TYPE github_api_calls_total counter\n\
             github_api_calls_total {}\n\
             # HELP stackoverflow_api_calls_total Total number of StackOverflow API calls\n\
             # TYPE stackoverflow_api_calls_total counter\n\
             stackoverflow_api_calls_total {}\n",
            snapshot.github_api_calls, snapshot.stackoverflow_api_calls,
        )
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ApiCallSnapshot {
    pub github_api_calls: u64,
    pub stackoverflow_api_calls: u64,
}
