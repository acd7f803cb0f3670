//! One ingestion run: reset both destination tables, then fetch and store
//! target by target.

use thiserror::Error;
use tracing::{debug, info};
use utils_metrics::ApiCallMetrics;

use crate::config::RunTargets;
use crate::db::issue::models::NewGithubIssue;
use crate::db::issue::queries::{
    insert_github_issue, reset_github_issues, InsertGithubIssueError, ResetGithubIssuesError,
};
use crate::db::post::models::NewSoPost;
use crate::db::post::queries::{
    insert_so_post, reset_so_posts, InsertSoPostError, ResetSoPostsError,
};
use crate::db::PgPool;
use crate::ingest::github::{fetch_repo_issues, FetchRepoIssuesError};
use crate::ingest::stackexchange::{fetch_recent_questions, FetchRecentQuestionsError};

/// Row counts from one completed run.
#[derive(Debug, Default, Clone, Copy)]
pub struct IngestionReport {
    pub issues_stored: usize,
    pub questions_stored: usize,
}

#[derive(Debug, Error)]
pub enum RunIngestionError {
    #[error("GetConnectionFromPool: {source}")]
    GetConnectionFromPool {
        #[from]
        source: r2d2::Error,
    },

    #[error("ResetGithubIssues: {source}")]
    ResetGithubIssues {
        #[from]
        source: ResetGithubIssuesError,
    },

    #[error("FetchRepoIssues: {source}")]
    FetchRepoIssues {
        #[from]
        source: FetchRepoIssuesError,
    },

    #[error("InsertGithubIssue: {source}")]
    InsertGithubIssue {
        #[from]
        source: InsertGithubIssueError,
    },

    #[error("ResetSoPosts: {source}")]
    ResetSoPosts {
        #[from]
        source: ResetSoPostsError,
    },

    #[error("FetchRecentQuestions: {source}")]
    FetchRecentQuestions {
        #[from]
        source: FetchRecentQuestionsError,
    },

    #[error("InsertSoPost: {source}")]
    InsertSoPost {
        #[from]
        source: InsertSoPostError,
    },
}

/// Executes one full fetch-and-store cycle over the configured targets.
///
/// Both destination tables are dropped and recreated before any fetching
/// starts, so a mid-run failure leaves them freshly reset and possibly
/// partially filled. Nothing is retried; the first error ends the run.
pub async fn run_ingestion(
    pool: &PgPool,
    targets: &RunTargets,
    metrics: &ApiCallMetrics,
    github_token: &str,
    github_api_base: &str,
    stackexchange_api_base: &str,
) -> Result<IngestionReport, RunIngestionError> {
    let mut conn = pool.get()?;
    let mut report = IngestionReport::default();

    reset_github_issues(&mut conn)?;
    info!("Created table for GitHub issues");
    reset_so_posts(&mut conn)?;
    info!("Created table for StackOverflow posts");

    for target in &targets.repos {
        info!(owner = %target.owner, repo = %target.name, "Fetching GitHub issues");

        let issues = fetch_repo_issues(
            github_api_base,
            github_token,
            &target.owner,
            &target.name,
            metrics,
        )
        .await?;

        for issue in &issues {
            debug!(repo = %issue.repo, number = issue.number, "Inserting issue");
            insert_github_issue(
                &mut conn,
                &NewGithubIssue {
                    title: &issue.title,
                    issue_number: issue.number,
                    created_at: issue.created_at,
                    closed_at: issue.closed_at,
                    repo: &issue.repo,
                },
            )?;
        }

        report.issues_stored += issues.len();
    }

    for technology in &targets.technologies {
        info!(technology = %technology, "Fetching StackOverflow questions");

        let questions = fetch_recent_questions(stackexchange_api_base, technology, metrics).await?;

        for question in &questions {
            debug!(technology = %question.technology, "Inserting question");
            insert_so_post(
                &mut conn,
                &NewSoPost {
                    title: &question.title,
                    body: &question.body,
                    created_at: question.created_at,
                    closed_at: question.closed_at,
                    technology: &question.technology,
                },
            )?;
        }

        report.questions_stored += questions.len();
    }

    Ok(report)
}
