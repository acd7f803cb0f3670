//! PostgreSQL access: connection pool plus one submodule per stored entity.

pub mod issue;
pub mod post;
pub mod schema;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use thiserror::Error;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

#[derive(Debug, Error)]
pub enum BuildPoolError {
    #[error("BuildPool: {source}")]
    BuildPool {
        #[from]
        source: r2d2::Error,
    },
}

/// Builds the connection pool for `database_url`, establishing the initial
/// connections eagerly so a bad URL surfaces here rather than mid-run.
pub fn build_pool(database_url: &str) -> Result<PgPool, BuildPoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);

    Pool::builder()
        .build(manager)
        .map_err(|source| BuildPoolError::BuildPool { source })
}

#[derive(Debug, Error)]
pub enum PingDatabaseError {
    #[error("GetConnectionFromPool: {source}")]
    GetConnectionFromPool { source: r2d2::Error },

    #[error("Ping: {source}")]
    Ping { source: diesel::result::Error },
}

/// Round-trips one trivial statement to verify connectivity.
pub fn ping(pool: &PgPool) -> Result<(), PingDatabaseError> {
    let mut conn = pool
        .get()
        .map_err(|source| PingDatabaseError::GetConnectionFromPool { source })?;

    diesel::sql_query("SELECT 1")
        .execute(&mut conn)
        .map_err(|source| PingDatabaseError::Ping { source })?;

    Ok(())
}
