use rusqlite::{params, TransactionBehavior};
use eyre::WrapErr;
use color_eyre::Result;
use super::entities::Session;
use super::mappers::{map_session, SESSION_FIELDS};
use super::{Pool, select_one};

pub fn insert_session(pool: &Pool, session: &Session) -> Result<()> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO sessions (session_key, user_id, created_at, expires_at) \
    VALUES (?, ?, ?, ?)",
    params![session.session_key, session.user_id, session.created_at, session.expires_at]
  ).context("Inserting session")?;
  Ok(())
}

// Expired sessions are treated as missing.
pub fn valid_session(pool: &Pool, session_key: &str, now: i64) -> Result<Option<Session>> {
  select_one(
    pool,
    &format!(
      "SELECT {} FROM sessions WHERE session_key = ? AND expires_at > ?",
      SESSION_FIELDS
    ),
    params![session_key, now],
    map_session
  )
}

pub fn set_session_user(
  pool: &Pool,
  session_key: &str,
  user_id: Option<i64>
) -> Result<bool> {
  let conn = pool.get()?;
  let changed = conn.execute(
    "UPDATE sessions SET user_id = ? WHERE session_key = ?",
    params![user_id, session_key]
  ).context("Updating session user")?;
  Ok(changed > 0)
}

// Swaps the old key for a new session. View events
// move along so the visitor is still counted once.
pub fn replace_session(
  pool: &Pool,
  old_key: Option<&str>,
  session: &Session
) -> Result<()> {
  let mut conn = pool.get()?;
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  tx.execute(
    "INSERT INTO sessions (session_key, user_id, created_at, expires_at) \
    VALUES (?, ?, ?, ?)",
    params![session.session_key, session.user_id, session.created_at, session.expires_at]
  )?;
  if let Some(old_key) = old_key {
    tx.execute(
      "UPDATE view_events SET session_key = ? WHERE session_key = ?",
      params![session.session_key, old_key]
    )?;
    tx.execute("DELETE FROM sessions WHERE session_key = ?", params![old_key])?;
  }
  tx.commit().context("Replacing session")
}

pub fn delete_expired_sessions(pool: &Pool, now: i64) -> Result<usize> {
  let conn = pool.get()?;
  conn.execute("DELETE FROM sessions WHERE expires_at <= ?", params![now])
    .context("Deleting expired sessions")
}
