use chrono::{DateTime, Utc};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Base URL of the GitHub REST API; tests substitute a local server.
pub const API_BASE: &str = "https://api.github.com";

/// One page of the issue-list endpoint, as received.
pub struct IssuesPageResult {
    pub body: String,
    pub status: StatusCode,
    /// Page number advertised by the upstream `rel="next"` cursor, if any.
    pub next_page: Option<u32>,
}

/// One raw issue item. Fields the upstream may omit stay optional; the
/// caller picks the defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    pub title: Option<String>,
    pub number: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Requests one page of issues for `owner`/`name`.
///
/// `page` is `None` for the first request; later requests pass the number
/// returned in [`IssuesPageResult::next_page`]. No `state` or `per_page`
/// overrides are sent, so the upstream defaults apply.
pub async fn fetch_issues_page(
    api_base: &str,
    token: &str,
    owner: &str,
    name: &str,
    page: Option<u32>,
) -> Result<IssuesPageResult, FetchIssuesPageError> {
    let url = format!("{api_base}/repos/{owner}/{name}/issues");

    let client = Client::new();

    let mut request = client
        .get(url)
        .header("Authorization", format!("Bearer {token}"))
        .header("Accept", "application/vnd.github+json")
        .header("User-Agent", "rust-client");

    if let Some(page) = page {
        request = request.query(&[("page", page)]);
    }

    let response = request
        .send()
        .await
        .map_err(|source| FetchIssuesPageError::RequestSend { source })?;

    let status = response.status();

    let next_page = response
        .headers()
        .get(header::LINK)
        .and_then(|value| value.to_str().ok())
        .and_then(next_page_number);

    let body = response
        .text()
        .await
        .map_err(|source| FetchIssuesPageError::ResponseRead { source })?;

    Ok(IssuesPageResult {
        body,
        status,
        next_page,
    })
}

/// Extracts the `rel="next"` page number from a `Link` response header.
///
/// The upstream advertises the cursor as
/// `<https://…/issues?page=2>; rel="next", <…>; rel="last"`; no `rel="next"`
/// entry means the current page is the last one.
fn next_page_number(link_header: &str) -> Option<u32> {
    link_header.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        if !params.contains("rel=\"next\"") {
            return None;
        }
        let url = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        let (_, query) = url.split_once('?')?;
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix("page="))
            .and_then(|page| page.parse().ok())
    })
}

#[derive(Debug, Error)]
pub enum FetchIssuesPageError {
    #[error("RequestSend: {source}")]
    RequestSend {
        source: reqwest::Error,
    },

    #[error("ResponseRead: {source}")]
    ResponseRead {
        source: reqwest::Error,
    },
}
