use chrono::{DateTime, Utc};
use interfaces_stackexchange_questions::index::{fetch_questions, FetchQuestionsError};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use utils_metrics::ApiCallMetrics;

use crate::extract::{self, ExtractError};

/// Sentinel stored when a question arrives without a body.
pub const NO_BODY: &str = "No Body";

/// Sentinel stored when an answer arrives without a body.
pub const NO_ANSWER_BODY: &str = "No answers yet";

/// One normalized question, ready for storage.
#[derive(Debug, Clone)]
pub struct Question {
    pub title: String,
    pub body: String,
    pub answers: Vec<Answer>,
    pub created_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub technology: String,
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub body: String,
}

#[derive(Debug, Error)]
pub enum FetchRecentQuestionsError {
    #[error("FetchQuestions: {source}")]
    FetchQuestions {
        #[from]
        source: FetchQuestionsError,
    },

    #[error("UpstreamStatus: {status} for tag {technology}")]
    UpstreamStatus {
        status: StatusCode,
        technology: String,
    },

    #[error("DecodeQuestions: {source}")]
    DecodeQuestions {
        #[from]
        source: serde_json::Error,
    },

    #[error("ExtractQuestion: {source}")]
    ExtractQuestion {
        #[from]
        source: ExtractError,
    },
}

/// Runs the one-hour-window query for a technology tag and normalizes every
/// returned item. Counts as one StackOverflow API call.
pub async fn fetch_recent_questions(
    api_base: &str,
    technology: &str,
    metrics: &ApiCallMetrics,
) -> Result<Vec<Question>, FetchRecentQuestionsError> {
    let result = fetch_questions(api_base, technology).await?;

    if !result.status.is_success() {
        return Err(FetchRecentQuestionsError::UpstreamStatus {
            status: result.status,
            technology: technology.to_string(),
        });
    }

    let document: Value = serde_json::from_str(&result.body)?;
    let items = extract::required_sequence(&document, "items")?;

    let questions = items
        .iter()
        .map(|item| map_question(item, technology))
        .collect::<Result<Vec<_>, _>>()?;

    metrics.record_stackoverflow_call();
    debug!(technology, count = questions.len(), "Fetched questions");

    Ok(questions)
}

/// Field policy for one raw question item: `title` is required, `body` falls
/// back to its sentinel, both epoch fields are optional, and each answer
/// body falls back to its own sentinel.
pub fn map_question(item: &Value, technology: &str) -> Result<Question, ExtractError> {
    let title = extract::required_text(item, "title")?;
    let body = extract::text_or(item, "body", NO_BODY)?;
    let created_at = extract::epoch_seconds(item, "creation_date")?;
    let closed_at = extract::epoch_seconds(item, "closed_date")?;

    let answers = match extract::optional_sequence(item, "answers")? {
        Some(raw_answers) => raw_answers
            .iter()
            .map(|raw_answer| {
                Ok(Answer {
                    body: extract::text_or(raw_answer, "body", NO_ANSWER_BODY)?,
                })
            })
            .collect::<Result<Vec<_>, ExtractError>>()?,
        None => Vec::new(),
    };

    Ok(Question {
        title,
        body,
        answers,
        created_at,
        closed_at,
        technology: technology.to_string(),
    })
}
