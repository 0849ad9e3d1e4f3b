use rusqlite::params;
use eyre::WrapErr;
use color_eyre::Result;
use super::entities::User;
use super::mappers::{map_user, USER_FIELDS};
use super::{Pool, select_one};
use crate::utils::bool_to_i32;

pub fn user_by_username(pool: &Pool, username: &str) -> Result<Option<User>> {
  select_one(
    pool,
    &format!("SELECT {} FROM users WHERE username = ?", USER_FIELDS),
    params![username],
    map_user
  )
}

pub fn user_by_id(pool: &Pool, id: i64) -> Result<Option<User>> {
  select_one(
    pool,
    &format!("SELECT {} FROM users WHERE id = ?", USER_FIELDS),
    params![id],
    map_user
  )
}

// Creates the user or resets its password and staff flag
// when the username already exists. Returns the user id.
pub fn upsert_user(
  pool: &Pool,
  username: &str,
  password_hash: &str,
  is_staff: bool,
  now: i64
) -> Result<i64> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO users (username, password_hash, is_staff, created_at) \
    VALUES (?1, ?2, ?3, ?4) \
    ON CONFLICT (username) DO UPDATE SET password_hash = ?2, is_staff = ?3",
    params![username, password_hash, bool_to_i32(is_staff), now]
  ).context("Saving user")?;
  conn.query_row(
    "SELECT id FROM users WHERE username = ?",
    params![username],
    |row| row.get(0)
  ).context("Reading saved user id")
}

pub fn touch_last_login(pool: &Pool, user_id: i64, now: i64) -> Result<()> {
  let conn = pool.get()?;
  conn.execute(
    "UPDATE users SET last_login = ? WHERE id = ?",
    params![now, user_id]
  ).context("Updating last login")?;
  Ok(())
}
