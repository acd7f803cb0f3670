use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db::schema::github_issues;

/// One stored GitHub issue.
#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = github_issues)]
pub struct GithubIssueRow {
    pub id: i32,
    pub title: String,
    pub issue_number: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub repo: String,
}

/// Insert shape for [`GithubIssueRow`]; `id` is assigned by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = github_issues)]
pub struct NewGithubIssue<'a> {
    pub title: &'a str,
    pub issue_number: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub repo: &'a str,
}
