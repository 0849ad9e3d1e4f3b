use actix_web::{
  cookie::{time::Duration, Cookie, SameSite},
  HttpRequest
};
use color_eyre::Result;
use log::debug;
use uuid::Uuid;
use crate::config::Config;
use crate::db::{self, entities::{Session, User}, Pool};
use crate::utils::time_utils::SECONDS_PER_DAY;

// Session as found from the cookie, with its user when
// someone is logged in.
#[derive(Debug, Clone)]
pub struct CurrentSession {
  pub session: Session,
  pub user: Option<User>
}

pub fn session_key_from(req: &HttpRequest, config: &Config) -> Option<String> {
  req.cookie(&config.session_cookie_name)
    .map(|c| c.value().to_string())
    .filter(|v| !v.is_empty())
}

// Unknown and expired keys count as no session.
pub fn current_session(
  pool: &Pool,
  config: &Config,
  req: &HttpRequest,
  now: i64
) -> Result<Option<CurrentSession>> {
  let key = match session_key_from(req, config) {
    Some(key) => key,
    None => return Ok(None)
  };
  let session = match db::valid_session(pool, &key, now)? {
    Some(session) => session,
    None => return Ok(None)
  };
  let user = match session.user_id {
    Some(user_id) => db::user_by_id(pool, user_id)?,
    None => None
  };
  Ok(Some(CurrentSession { session, user }))
}

// Fresh random key, not saved yet.
pub fn new_session(config: &Config, user_id: Option<i64>, now: i64) -> Session {
  Session {
    session_key: Uuid::new_v4().to_string(),
    user_id,
    created_at: now,
    expires_at: now + config.session_lifetime_days * SECONDS_PER_DAY
  }
}

// Returns the current session or a brand new anonymous
// one. The bool is true when the session was created and
// the cookie has to be sent.
pub fn ensure_session(
  pool: &Pool,
  config: &Config,
  req: &HttpRequest,
  now: i64
) -> Result<(CurrentSession, bool)> {
  if let Some(current) = current_session(pool, config, req, now)? {
    return Ok((current, false));
  }
  let session = new_session(config, None, now);
  db::insert_session(pool, &session)?;
  debug!("New session {}", session.session_key);
  Ok((CurrentSession { session, user: None }, true))
}

pub fn session_cookie(config: &Config, session_key: &str) -> Cookie<'static> {
  Cookie::build(config.session_cookie_name.clone(), session_key.to_string())
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .secure(config.secure_cookies)
    .max_age(Duration::days(config.session_lifetime_days))
    .finish()
}
