use chrono::{Duration, Utc};
use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Base URL of the StackExchange API; tests substitute a local server.
pub const API_BASE: &str = "https://api.stackexchange.com/2.3";

/// The question-search response, as received.
pub struct QuestionsQueryResult {
    pub body: String,
    pub status: StatusCode,
}

/// Issues the single question-search request for one technology tag:
/// StackOverflow questions tagged with it, most recently active first,
/// restricted to activity within the past hour. No pagination.
pub async fn fetch_questions(
    api_base: &str,
    tag: &str,
) -> Result<QuestionsQueryResult, FetchQuestionsError> {
    let url = query_url(api_base, tag, recent_window_start());

    let client = Client::new();

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchQuestionsError::RequestSend { source })?;

    let status = response.status();

    let body = response
        .text()
        .await
        .map_err(|source| FetchQuestionsError::ResponseRead { source })?;

    Ok(QuestionsQueryResult { body, status })
}

/// Unix timestamp one hour before the current instant, the lower bound of
/// the activity window.
pub fn recent_window_start() -> i64 {
    (Utc::now() - Duration::hours(1)).timestamp()
}

fn query_url(api_base: &str, tag: &str, fromdate: i64) -> String {
    format!(
        "{api_base}/questions?order=desc&sort=activity&tagged={tag}&site=stackoverflow&fromdate={fromdate}"
    )
}

#[derive(Debug, Error)]
pub enum FetchQuestionsError {
    #[error("RequestSend: {source}")]
    RequestSend {
        source: reqwest::Error,
    },

    #[error("ResponseRead: {source}")]
    ResponseRead {
        source: reqwest::Error,
    },
}
