use chrono::{DateTime, Utc};
use interfaces_github_issues::index::{fetch_issues_page, FetchIssuesPageError, RawIssue};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;
use utils_metrics::ApiCallMetrics;

/// One normalized issue, ready for storage.
#[derive(Debug, Clone)]
pub struct Issue {
    pub title: String,
    pub number: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub repo: String,
}

#[derive(Debug, Error)]
pub enum FetchRepoIssuesError {
    #[error("FetchIssuesPage: {source}")]
    FetchIssuesPage {
        #[from]
        source: FetchIssuesPageError,
    },

    #[error("UpstreamStatus: {status} for {owner}/{name}")]
    UpstreamStatus {
        status: StatusCode,
        owner: String,
        name: String,
    },

    #[error("DecodeIssuesPage: {source}")]
    DecodeIssuesPage {
        #[from]
        source: serde_json::Error,
    },
}

/// Walks the issue list of `owner`/`name` page by page, following the
/// next-page cursor until the upstream stops advertising one, then maps the
/// accumulated raw items into [`Issue`]s. The whole walk counts as one
/// GitHub API call.
pub async fn fetch_repo_issues(
    api_base: &str,
    token: &str,
    owner: &str,
    name: &str,
    metrics: &ApiCallMetrics,
) -> Result<Vec<Issue>, FetchRepoIssuesError> {
    let mut raw_issues: Vec<RawIssue> = Vec::new();
    let mut page = None;

    loop {
        let result = fetch_issues_page(api_base, token, owner, name, page).await?;

        if !result.status.is_success() {
            return Err(FetchRepoIssuesError::UpstreamStatus {
                status: result.status,
                owner: owner.to_string(),
                name: name.to_string(),
            });
        }

        let items: Vec<RawIssue> = serde_json::from_str(&result.body)?;
        raw_issues.extend(items);

        match result.next_page {
            Some(next) => page = Some(next),
            None => break,
        }
    }

    metrics.record_github_call();
    debug!(repo = %name, count = raw_issues.len(), "Fetched issue pages");

    Ok(raw_issues
        .into_iter()
        .map(|raw| normalize(raw, name))
        .collect())
}

/// Issues with missing upstream fields still become rows: empty title,
/// issue number zero, open-ended timestamps.
fn normalize(raw: RawIssue, repo: &str) -> Issue {
    Issue {
        title: raw.title.unwrap_or_default(),
        number: raw.number.unwrap_or_default(),
        created_at: raw.created_at,
        closed_at: raw.closed_at,
        repo: repo.to_string(),
    }
}
