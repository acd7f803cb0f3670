use diesel::prelude::*;
use thiserror::Error;

use crate::db::{post::models::*, schema::so_posts::dsl::*};

const DROP_SO_POSTS: &str = "DROP TABLE IF EXISTS so_posts";

const CREATE_SO_POSTS: &str = "
CREATE TABLE IF NOT EXISTS so_posts (
    id SERIAL PRIMARY KEY,
    title TEXT,
    body TEXT,
    created_at TIMESTAMPTZ,
    closed_at TIMESTAMPTZ,
    technology TEXT
)";

#[derive(Debug, Error)]
pub enum ResetSoPostsError {
    #[error("ResetSoPosts: {source}")]
    ResetSoPosts {
        #[from]
        source: diesel::result::Error,
    },
}

/// Drops and recreates the question table, discarding everything a previous
/// run stored.
pub fn reset_so_posts(conn: &mut PgConnection) -> Result<(), ResetSoPostsError> {
    diesel::sql_query(DROP_SO_POSTS).execute(conn)?;
    diesel::sql_query(CREATE_SO_POSTS).execute(conn)?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum InsertSoPostError {
    #[error("InsertSoPost: {source}")]
    InsertSoPost {
        #[from]
        source: diesel::result::Error,
    },
}

/// Stores one question in its own autocommitted statement and returns the
/// row as the database now holds it.
pub fn insert_so_post(
    conn: &mut PgConnection,
    new_post: &NewSoPost,
) -> Result<SoPostRow, InsertSoPostError> {
    diesel::insert_into(so_posts)
        .values(new_post)
        .get_result(conn)
        .map_err(|source| InsertSoPostError::InsertSoPost { source })
}
