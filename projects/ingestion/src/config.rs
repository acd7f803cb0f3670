//! Process settings from the environment and the declarative run-target
//! list from disk.

use std::env;
use std::num::ParseIntError;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Default location of the run-target file, relative to the working
/// directory.
pub const DEFAULT_TARGETS_PATH: &str = "targets.json";

/// Port serving the placeholder endpoints unless `PORT` overrides it.
const DEFAULT_PORT: u16 = 8080;

/// Environment-sourced settings. The bearer token and the database URL have
/// no fallback; ingestion cannot run without them.
#[derive(Debug, Clone)]
pub struct Settings {
    pub github_token: String,
    pub database_url: String,
    pub port: u16,
}

#[derive(Debug, Error)]
pub enum LoadSettingsError {
    #[error("MissingGithubToken: GITHUB_TOKEN is not set")]
    MissingGithubToken,

    #[error("MissingDatabaseUrl: DATABASE_URL is not set")]
    MissingDatabaseUrl,

    #[error("InvalidPort: {value}: {source}")]
    InvalidPort { value: String, source: ParseIntError },
}

pub fn load_settings() -> Result<Settings, LoadSettingsError> {
    let github_token =
        env::var("GITHUB_TOKEN").map_err(|_| LoadSettingsError::MissingGithubToken)?;
    let database_url =
        env::var("DATABASE_URL").map_err(|_| LoadSettingsError::MissingDatabaseUrl)?;

    let port = match env::var("PORT") {
        Ok(value) => value
            .parse()
            .map_err(|source| LoadSettingsError::InvalidPort { value, source })?,
        Err(_) => DEFAULT_PORT,
    };

    Ok(Settings {
        github_token,
        database_url,
        port,
    })
}

/// Declarative run targets: which repositories and technology tags a run
/// covers, processed in declared order.
#[derive(Debug, Clone, Deserialize)]
pub struct RunTargets {
    pub repos: Vec<RepoTarget>,
    pub technologies: Vec<String>,
}

/// One repository to pull issues from.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoTarget {
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum LoadTargetsError {
    #[error("ReadTargetsFile: {path}: {source}")]
    ReadTargetsFile {
        path: String,
        source: std::io::Error,
    },

    #[error("ParseTargetsFile: {path}: {source}")]
    ParseTargetsFile {
        path: String,
        source: serde_json::Error,
    },
}

pub fn load_targets(path: &Path) -> Result<RunTargets, LoadTargetsError> {
    let contents =
        std::fs::read_to_string(path).map_err(|source| LoadTargetsError::ReadTargetsFile {
            path: path.display().to_string(),
            source,
        })?;

    serde_json::from_str(&contents).map_err(|source| LoadTargetsError::ParseTargetsFile {
        path: path.display().to_string(),
        source,
    })
}
