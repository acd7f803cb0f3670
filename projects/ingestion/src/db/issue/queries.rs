use diesel::prelude::*;
use thiserror::Error;

use crate::db::{issue::models::*, schema::github_issues::dsl::*};

const DROP_GITHUB_ISSUES: &str = "DROP TABLE IF EXISTS github_issues";

const CREATE_GITHUB_ISSUES: &str = "
CREATE TABLE IF NOT EXISTS github_issues (
    id SERIAL PRIMARY KEY,
    title TEXT,
    issue_number INT,
    created_at TIMESTAMPTZ,
    closed_at TIMESTAMPTZ,
    repo TEXT
)";

#[derive(Debug, Error)]
pub enum ResetGithubIssuesError {
    #[error("ResetGithubIssues: {source}")]
    ResetGithubIssues {
        #[from]
        source: diesel::result::Error,
    },
}

/// Drops and recreates the issue table, discarding everything a previous run
/// stored.
pub fn reset_github_issues(conn: &mut PgConnection) -> Result<(), ResetGithubIssuesError> {
    diesel::sql_query(DROP_GITHUB_ISSUES).execute(conn)?;
    diesel::sql_query(CREATE_GITHUB_ISSUES).execute(conn)?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum InsertGithubIssueError {
    #[error("InsertGithubIssue: {source}")]
    InsertGithubIssue {
        #[from]
        source: diesel::result::Error,
    },
}

/// Stores one issue in its own autocommitted statement and returns the row
/// as the database now holds it.
pub fn insert_github_issue(
    conn: &mut PgConnection,
    new_issue: &NewGithubIssue,
) -> Result<GithubIssueRow, InsertGithubIssueError> {
    diesel::insert_into(github_issues)
        .values(new_issue)
        .get_result(conn)
        .map_err(|source| InsertGithubIssueError::InsertGithubIssue { source })
}
