use rusqlite::{Params, Row, OptionalExtension};
use r2d2_sqlite::SqliteConnectionManager;
use std::time::Duration;
pub mod entities;
pub mod queries;
pub mod helpers;
mod mappers;
mod schema;
mod posts;
mod videos;
mod site_config;
mod view_events;
mod users;
mod sessions;
use eyre::WrapErr;
use color_eyre::Result;

pub use schema::{create_schema, sqlite_version};
pub use posts::*;
pub use videos::*;
pub use site_config::*;
pub use view_events::*;
pub use users::*;
pub use sessions::*;

// Type alias to make function signatures much clearer:
pub type Pool = r2d2::Pool<SqliteConnectionManager>;

// How long a connection waits on a locked database
// before giving up with SQLITE_BUSY.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn open_pool(db_path: &str) -> Result<Pool> {
  let manager = SqliteConnectionManager::file(db_path)
    .with_init(|conn| {
      conn.busy_timeout(BUSY_TIMEOUT)?;
      conn.execute_batch("PRAGMA foreign_keys = ON;")
    });
  Pool::new(manager)
    .with_context(|| format!("Opening database at {}", db_path))
}

// Stole most of the signature from the rusqlite doc.
fn select_many<T, P, F>(
  pool: &Pool,
  query: &str,
  params: P,
  mapper: F
) -> Result<Vec<T>>
  where
    P: Params,
    F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let conn = pool.get()?;
  let mut stmt = conn.prepare(query)?;
  let rows = stmt.query_map(params, mapper)?;
  rows.collect::<Result<Vec<T>, rusqlite::Error>>()
    .context("Generic select_many query")
}

// Same thing for queries that return zero or one row.
fn select_one<T, P, F>(
  pool: &Pool,
  query: &str,
  params: P,
  mapper: F
) -> Result<Option<T>>
  where
    P: Params,
    F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let conn = pool.get()?;
  conn.query_row(query, params, mapper)
    .optional()
    .context("Generic select_one query")
}

fn count<P: Params>(pool: &Pool, query: &str, params: P) -> Result<i64> {
  let conn = pool.get()?;
  conn.query_row(query, params, |row| row.get(0))
    .context("Generic count query")
}

// Throwaway database in a temp directory, the directory
// has to outlive the pool.
#[cfg(test)]
pub fn test_pool() -> (tempfile::TempDir, Pool) {
  let dir = tempfile::tempdir().expect("Could not create temp dir");
  let path = dir.path().join("test.db");
  let pool = open_pool(path.to_str().expect("Temp path is not UTF-8"))
    .expect("Could not open test database");
  create_schema(&pool).expect("Could not create schema");
  (dir, pool)
}

#[cfg(test)]
pub use posts::tests::sample_post;
