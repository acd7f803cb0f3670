use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db::schema::so_posts;

/// One stored StackOverflow question.
#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = so_posts)]
pub struct SoPostRow {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub technology: String,
}

/// Insert shape for [`SoPostRow`]; `id` is assigned by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = so_posts)]
pub struct NewSoPost<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub created_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub technology: &'a str,
}
