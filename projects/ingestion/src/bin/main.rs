use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::{extract::Extension, routing::get, serve, Router};
use thiserror::Error;
use tracing::{error, info};
use utils_metrics::ApiCallMetrics;

use projects_ingestion::config::{self, LoadSettingsError, LoadTargetsError};
use projects_ingestion::db::{self, BuildPoolError, PingDatabaseError};
use projects_ingestion::endpoints::github::index::handler as github_handler;
use projects_ingestion::endpoints::metrics::index::handler as metrics_handler;
use projects_ingestion::endpoints::stackoverflow::index::handler as stackoverflow_handler;
use projects_ingestion::run::{run_ingestion, RunIngestionError};

/// The metrics listener always binds here; only the placeholder server's
/// port is configurable.
const METRICS_PORT: u16 = 2112;

#[derive(Debug, Error)]
pub enum MainError {
    #[error("TracingInit: {source}")]
    TracingInit {
        #[source]
        source: utils_trace::TracingInitError,
    },
    #[error("LoadSettings: {source}")]
    LoadSettings {
        #[source]
        source: LoadSettingsError,
    },
    #[error("LoadTargets: {source}")]
    LoadTargets {
        #[source]
        source: LoadTargetsError,
    },
    #[error("BuildPool: {source}")]
    BuildPool {
        #[source]
        source: BuildPoolError,
    },
    #[error("PingDatabase: {source}")]
    PingDatabase {
        #[source]
        source: PingDatabaseError,
    },
    #[error("TcpListenerBind: {source}")]
    TcpListenerBind {
        #[source]
        source: std::io::Error,
    },
    #[error("RunIngestion: {source}")]
    RunIngestion {
        #[source]
        source: RunIngestionError,
    },
    #[error("Serve: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
    #[error("JoinServerTask: {source}")]
    JoinServerTask {
        #[source]
        source: tokio::task::JoinError,
    },
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
    // A .env file is a local convenience; the environment itself is the
    // source of truth.
    dotenvy::dotenv().ok();

    utils_trace::init("info").map_err(|source| MainError::TracingInit { source })?;

    let settings = match config::load_settings() {
        Ok(settings) => settings,
        Err(source) => {
            error!(error = %source, "Could not load settings");
            return Err(MainError::LoadSettings { source });
        }
    };

    let targets = match config::load_targets(Path::new(config::DEFAULT_TARGETS_PATH)) {
        Ok(targets) => targets,
        Err(source) => {
            error!(error = %source, "Could not load run targets");
            return Err(MainError::LoadTargets { source });
        }
    };

    let pool = match db::build_pool(&settings.database_url) {
        Ok(pool) => pool,
        Err(source) => {
            error!(error = %source, "Error on initializing database connection");
            return Err(MainError::BuildPool { source });
        }
    };

    info!("Testing database connection");
    if let Err(source) = db::ping(&pool) {
        error!(error = %source, "Error on database connection");
        return Err(MainError::PingDatabase { source });
    }
    info!("Database connection established");

    let metrics = Arc::new(ApiCallMetrics::new());

    // Set up the placeholder router
    let app = Router::new()
        .route("/github", get(github_handler))
        .route("/stackoverflow", get(stackoverflow_handler));

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| MainError::TcpListenerBind { source })?;
    info!("Server running on addr: {}", addr);
    let app_server = tokio::spawn(async move { serve(listener, app).await });

    // Set up the metrics router
    let metrics_app = Router::new()
        .route("/metrics", get(metrics_handler))
        .layer(Extension(metrics.clone()));

    let metrics_addr = SocketAddr::from(([0, 0, 0, 0], METRICS_PORT));
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr)
        .await
        .map_err(|source| MainError::TcpListenerBind { source })?;
    info!("Metrics server running on addr: {}", metrics_addr);
    let metrics_server = tokio::spawn(async move { serve(metrics_listener, metrics_app).await });

    let report = match run_ingestion(
        &pool,
        &targets,
        &metrics,
        &settings.github_token,
        interfaces_github_issues::index::API_BASE,
        interfaces_stackexchange_questions::index::API_BASE,
    )
    .await
    {
        Ok(report) => report,
        Err(source) => {
            error!(error = %source, "Ingestion run failed");
            return Err(MainError::RunIngestion { source });
        }
    };

    info!(
        issues = report.issues_stored,
        questions = report.questions_stored,
        "Ingestion run complete"
    );

    // Both servers outlive the run; either one ending is fatal.
    let served = tokio::select! {
        joined = app_server => joined,
        joined = metrics_server => joined,
    };

    match served {
        Ok(serve_result) => serve_result.map_err(|source| MainError::Serve { source }),
        Err(source) => Err(MainError::JoinServerTask { source }),
    }
}
